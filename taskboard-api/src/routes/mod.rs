/// API route handlers
///
/// - `health`: liveness endpoint
/// - `auth`: login and token refresh
/// - `crud`: generic controller dispatch shared by the resources below
/// - `todo`: the acting user's to-do items
/// - `admin_users`: user administration
/// - `user_permissions`: the acting user's permission names

pub mod admin_users;
pub mod auth;
pub mod crud;
pub mod health;
pub mod todo;
pub mod user_permissions;
