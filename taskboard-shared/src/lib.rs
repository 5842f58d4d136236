//! # Taskboard shared library
//!
//! Types and data access shared by the API server and its tests.
//!
//! ## Modules
//!
//! - `models`: users, roles, permissions, to-do items and statuses
//! - `repository`: repository traits, PostgreSQL and in-memory backends,
//!   and the per-user [`repository::UserScope`]
//! - `auth`: password hashing, JWT, authentication middleware and
//!   authorization guards
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod repository;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
