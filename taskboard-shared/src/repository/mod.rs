/// Repository layer
///
/// Every table is reached through an `async_trait` repository so the API
/// server can run against PostgreSQL ([`postgres`]) or the in-process
/// store ([`memory`]) used by tests and local development. The
/// [`Repositories`] registry bundles one implementation of each trait.
///
/// To-do items and role assignments are never touched directly by
/// handlers: they go through a [`UserScope`], which injects the owner id
/// into every query.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::repository::Repositories;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repos = Repositories::in_memory();
/// let scope = repos.user_scope(1).await?.expect("user exists");
/// let groups = scope.get_todos_by_status_groups().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;
mod registry;
mod scope;

pub use registry::Repositories;
pub use scope::UserScope;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::models::role::Role;
use crate::models::todo::{CreateTodoItem, TodoItem, TodoStatus, UpdateTodoItem};
use crate::models::user::{CreateUser, UpdateUser, User, UserStatus};

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Target row does not exist
    #[error("{0}")]
    NotFound(String),

    /// A referenced row (status, role) does not exist
    #[error("{0}")]
    InvalidReference(String),

    /// Unique constraint violated
    #[error("{0}")]
    Conflict(String),

    /// A write succeeded but the row could not be read back
    #[error("{0}")]
    Consistency(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// User accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Every user, soft-deleted ones included, ordered by id
    async fn all(&self) -> RepoResult<Vec<User>>;

    /// Users that are not soft-deleted, ordered by id
    async fn all_existing(&self) -> RepoResult<Vec<User>>;

    async fn find_by_id(&self, id: i64, with_trashed: bool) -> RepoResult<Option<User>>;

    /// Non-deleted user with the given email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Inserts a user
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Conflict`] if the email is taken.
    async fn create(&self, user: CreateUser) -> RepoResult<User>;

    /// Inserts a user together with its role assignments, all or nothing
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::Conflict`] if the email is taken
    /// - [`RepositoryError::InvalidReference`] for an unknown role name;
    ///   no user row is left behind
    async fn create_with_roles(&self, user: CreateUser, role_names: &[String])
        -> RepoResult<User>;

    /// Writes the `Some` fields of `attrs` and bumps `updated_at`
    ///
    /// Returns whether a row matched. Soft-deleted rows match too.
    async fn apply_update(&self, id: i64, attrs: &UpdateUser) -> RepoResult<bool>;

    /// Updates a user and returns the canonical row
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] if no row has this id
    /// - [`RepositoryError::Consistency`] if the row vanished between the
    ///   write and the read-back
    async fn update(&self, id: i64, attrs: &UpdateUser) -> RepoResult<User> {
        if !self.apply_update(id, attrs).await? {
            return Err(RepositoryError::NotFound("User not found".into()));
        }

        self.find_by_id(id, true).await?.ok_or_else(|| {
            RepositoryError::Consistency(format!("User {id} vanished after update"))
        })
    }

    /// Soft-deletes a user by stamping `deleted_at`
    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let user = self.update(id, &UpdateUser::soft_delete(Utc::now())).await?;
        Ok(user.is_deleted())
    }

    async fn set_active_state(&self, id: i64, active: bool) -> RepoResult<User> {
        let status = if active {
            UserStatus::Active
        } else {
            UserStatus::Blocked
        };
        self.update(id, &UpdateUser::status(status)).await
    }

    async fn is_active(&self, id: i64) -> RepoResult<bool> {
        Ok(self
            .find_by_id(id, false)
            .await?
            .map(|user| user.is_active())
            .unwrap_or(false))
    }

    /// A missing user counts as blocked
    async fn is_blocked(&self, id: i64) -> RepoResult<bool> {
        Ok(!self.is_active(id).await?)
    }
}

/// To-do items, always addressed together with their owner
#[async_trait]
pub trait TodoItemRepository: Send + Sync {
    /// Owner's items ordered by id
    async fn find_by_user_id(&self, user_id: i64) -> RepoResult<Vec<TodoItem>>;

    async fn find_user_todo(&self, id: i64, user_id: i64) -> RepoResult<Option<TodoItem>>;

    async fn create(&self, item: CreateTodoItem) -> RepoResult<TodoItem>;

    /// Writes the `Some` fields of `attrs` on the owner's item
    ///
    /// Returns whether a row matched.
    async fn apply_update(&self, id: i64, user_id: i64, attrs: &UpdateTodoItem)
        -> RepoResult<bool>;

    /// Updates the owner's item and returns the canonical row
    ///
    /// # Errors
    ///
    /// [`RepositoryError::NotFound`] when the item does not exist or
    /// belongs to someone else.
    async fn update(&self, id: i64, user_id: i64, attrs: &UpdateTodoItem) -> RepoResult<TodoItem> {
        if !self.apply_update(id, user_id, attrs).await? {
            return Err(RepositoryError::NotFound("Todo item not found".into()));
        }

        self.find_user_todo(id, user_id).await?.ok_or_else(|| {
            RepositoryError::Consistency(format!("Todo item {id} vanished after update"))
        })
    }

    /// Deletes the owner's item, returning whether a row was removed
    async fn delete(&self, id: i64, user_id: i64) -> RepoResult<bool>;
}

/// The fixed status taxonomy
#[async_trait]
pub trait TodoStatusRepository: Send + Sync {
    /// All statuses ordered by position
    async fn all(&self) -> RepoResult<Vec<TodoStatus>>;

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<TodoStatus>>;

    /// The status flagged `initial_default`
    async fn initial_default(&self) -> RepoResult<Option<TodoStatus>>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn all(&self) -> RepoResult<Vec<Role>>;

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>>;
}

/// User-role assignments
#[async_trait]
pub trait UsersRoleRepository: Send + Sync {
    /// Whether the user holds any role at all
    async fn has_roles(&self, user_id: i64) -> RepoResult<bool>;

    async fn has_role(&self, user_id: i64, role_id: i32) -> RepoResult<bool>;

    /// Adds the assignment; a no-op when it already exists
    async fn assign_role(&self, user_id: i64, role_id: i32) -> RepoResult<()>;

    /// Removes the assignment, returning whether it existed
    async fn unset_role(&self, user_id: i64, role_id: i32) -> RepoResult<bool>;

    /// Names of the user's roles, sorted
    async fn user_role_names(&self, user_id: i64) -> RepoResult<Vec<String>>;
}

#[async_trait]
pub trait RolePermissionsRepository: Send + Sync {
    /// Permission names granted to any of the roles, de-duplicated and sorted
    async fn list_role_permission_names(&self, role_names: &[String]) -> RepoResult<Vec<String>>;
}

#[async_trait]
pub trait HealthCheckRepository: Send + Sync {
    /// Whether the backing store answers
    async fn ping(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_passed_through() {
        let err = RepositoryError::NotFound("User not found".into());
        assert_eq!(err.to_string(), "User not found");

        let err = RepositoryError::Database(sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("Database error"));
    }

    /// Accepts every write but never finds the row afterwards
    struct VanishingUsers;

    #[async_trait]
    impl UserRepository for VanishingUsers {
        async fn all(&self) -> RepoResult<Vec<User>> {
            Ok(Vec::new())
        }

        async fn all_existing(&self) -> RepoResult<Vec<User>> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, _id: i64, _with_trashed: bool) -> RepoResult<Option<User>> {
            Ok(None)
        }

        async fn find_by_email(&self, _email: &str) -> RepoResult<Option<User>> {
            Ok(None)
        }

        async fn create(&self, _user: CreateUser) -> RepoResult<User> {
            Err(RepositoryError::Conflict("unsupported".into()))
        }

        async fn create_with_roles(
            &self,
            _user: CreateUser,
            _role_names: &[String],
        ) -> RepoResult<User> {
            Err(RepositoryError::Conflict("unsupported".into()))
        }

        async fn apply_update(&self, _id: i64, _attrs: &UpdateUser) -> RepoResult<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_vanished_row_after_update_is_consistency_error() {
        let err = VanishingUsers
            .update(1, &UpdateUser::status(UserStatus::Blocked))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Consistency(_)));

        let err = VanishingUsers.delete(1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Consistency(_)));
    }

    #[tokio::test]
    async fn test_update_then_find_with_trashed_observes_write() {
        let store = memory::MemoryStore::seeded();
        let user = UserRepository::create(
            &store,
            CreateUser {
                name: "Before".into(),
                email: "before@example.com".into(),
                password: "hash".into(),
                status: UserStatus::Active,
            },
        )
        .await
        .unwrap();

        let attrs = UpdateUser {
            name: Some("After".into()),
            email: Some("after@example.com".into()),
            ..Default::default()
        };
        UserRepository::update(&store, user.id, &attrs).await.unwrap();

        let found = UserRepository::find_by_id(&store, user.id, true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "After");
        assert_eq!(found.email, "after@example.com");
        assert!(found.updated_at >= user.updated_at);
    }
}
