/// PostgreSQL repositories
///
/// Each struct wraps a cloned [`PgPool`]. Queries are plain `sqlx::query*`
/// calls with positional binds; dynamic `UPDATE`s are assembled field by
/// field.

mod health;
mod role;
mod todo;
mod user;

pub use health::PgHealthCheckRepository;
pub use role::{PgRolePermissionsRepository, PgRoleRepository, PgUsersRoleRepository};
pub use todo::{PgTodoItemRepository, PgTodoStatusRepository};
pub use user::PgUserRepository;

use super::RepositoryError;

/// Maps constraint violations to repository errors
fn map_constraint(err: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_string());
        }
        if db.is_foreign_key_violation() {
            return RepositoryError::InvalidReference(
                db.constraint().unwrap_or("foreign key").to_string(),
            );
        }
    }
    RepositoryError::Database(err)
}
