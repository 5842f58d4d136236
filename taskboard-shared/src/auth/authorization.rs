/// Request-scoped repository resolution and permission guards
///
/// Handlers never build a [`UserScope`] by hand. They call
/// [`define_user_repo`] for the acting user or [`resolve_user_scope`] for a
/// user addressed by path id, then guard themselves with
/// [`require_permission`].

use super::middleware::CurrentUser;
use crate::repository::{RepositoryError, Repositories, UserScope};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The request carries no resolved user
    #[error("User is not defined")]
    UserNotDefined,

    /// The addressed user does not exist or is soft-deleted
    #[error("User not found")]
    UserNotFound,

    #[error("Missing required permission: {0}")]
    MissingPermission(String),

    #[error("Users cannot {0} themselves")]
    SelfAction(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Scope for the acting user
///
/// # Errors
///
/// [`AuthzError::UserNotDefined`] when authentication attached no user.
pub fn define_user_repo(
    current: Option<&CurrentUser>,
    repos: &Repositories,
) -> Result<UserScope, AuthzError> {
    let CurrentUser(user) = current.ok_or(AuthzError::UserNotDefined)?;
    Ok(UserScope::new(user.clone(), repos.clone()))
}

/// Scope for a user addressed by id
///
/// # Errors
///
/// [`AuthzError::UserNotFound`] for unknown or soft-deleted users.
pub async fn resolve_user_scope(
    repos: &Repositories,
    user_id: i64,
) -> Result<UserScope, AuthzError> {
    repos
        .user_scope(user_id)
        .await?
        .ok_or(AuthzError::UserNotFound)
}

/// Fails unless one of the scope user's roles grants `permission`
pub async fn require_permission(scope: &UserScope, permission: &str) -> Result<(), AuthzError> {
    if !scope.has_permission(permission).await? {
        return Err(AuthzError::MissingPermission(permission.to_string()));
    }

    Ok(())
}

/// Fails when the acting user targets their own account
pub fn forbid_self(scope: &UserScope, target_user_id: i64, action: &'static str) -> Result<(), AuthzError> {
    if scope.user_id() == target_user_id {
        return Err(AuthzError::SelfAction(action));
    }

    Ok(())
}
