/// Startup seeding of the administrator account

use crate::config::AdminSeedConfig;
use anyhow::Context;
use taskboard_shared::{
    auth::password::hash_password,
    models::{
        role::roles,
        user::{CreateUser, UpdateUser, User, UserStatus},
    },
    repository::{Repositories, UserScope},
};
use tracing::info;

/// Makes sure an active account with the `admin` role exists for `seed.email`
///
/// Creates the account when no user has that email. An existing account
/// keeps its password and only gets the role added; a soft-deleted one is
/// restored and reactivated first, since its row still holds the email.
/// Returns the administrator.
pub async fn ensure_admin(repos: &Repositories, seed: &AdminSeedConfig) -> anyhow::Result<User> {
    let users = repos.users();

    let user = match users.find_by_email(&seed.email).await? {
        Some(user) => user,
        None => match users.all().await?.into_iter().find(|u| u.email == seed.email) {
            Some(trashed) => {
                let restored = users
                    .update(
                        trashed.id,
                        &UpdateUser {
                            status: Some(UserStatus::Active),
                            deleted_at: Some(None),
                            ..Default::default()
                        },
                    )
                    .await
                    .context("Failed to restore administrator account")?;
                info!(user_id = restored.id, email = %restored.email, "Administrator account restored");
                restored
            }
            None => {
                let password =
                    hash_password(&seed.password).context("Failed to hash admin password")?;
                let user = users
                    .create(CreateUser {
                        name: seed.name.clone(),
                        email: seed.email.clone(),
                        password,
                        status: UserStatus::Active,
                    })
                    .await?;
                info!(user_id = user.id, email = %user.email, "Administrator account created");
                user
            }
        },
    };

    let scope = UserScope::new(user, repos.clone());
    if scope.assign_role_if_not_exists(roles::ADMIN).await? {
        info!(user_id = scope.user_id(), "Admin role granted");
    }

    Ok(scope.into_user())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_shared::models::role::permissions;

    fn seed() -> AdminSeedConfig {
        AdminSeedConfig {
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            password: "rootpass1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let repos = Repositories::in_memory();

        let first = ensure_admin(&repos, &seed()).await.unwrap();
        let second = ensure_admin(&repos, &seed()).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repos.users().all().await.unwrap().len(), 1);

        let scope = repos.user_scope(first.id).await.unwrap().unwrap();
        assert_eq!(scope.role_names().await.unwrap(), vec!["admin".to_string()]);
        assert!(scope
            .has_permission(permissions::CAN_MANAGE_USERS)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_ensure_admin_restores_soft_deleted_account() {
        let repos = Repositories::in_memory();
        let first = ensure_admin(&repos, &seed()).await.unwrap();
        repos.users().delete(first.id).await.unwrap();

        let restored = ensure_admin(&repos, &seed()).await.unwrap();

        assert_eq!(restored.id, first.id);
        assert!(!restored.is_deleted());
        assert!(restored.is_active());
        assert_eq!(repos.users().all().await.unwrap().len(), 1);
    }
}
