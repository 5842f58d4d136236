/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing, verification and the strength rule
/// - [`jwt`]: HS256 access and refresh tokens
/// - [`middleware`]: bearer-token authentication attaching [`middleware::CurrentUser`]
/// - [`authorization`]: user-scope resolution and permission guards

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
