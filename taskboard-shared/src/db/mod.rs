/// Database plumbing
///
/// - `pool`: PostgreSQL connection pool
/// - `migrations`: embedded schema migrations
///
/// Queries themselves live in [`crate::repository::postgres`].

pub mod migrations;
pub mod pool;
