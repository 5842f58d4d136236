/// User administration
///
/// Mounted at `/admin/users`. The CRUD hooks require `canManageUsers`;
/// the custom route below requires `canManageUsersTodoes`.
///
/// ```text
/// GET /admin/users/todoes/:id   -> {"items": {"userId": [...]}}
/// ```
///
/// Listing includes soft-deleted users (`deletedAt` set). Update, delete
/// and the to-do listing only address existing users and answer 404
/// otherwise. Administrators cannot delete or block themselves, nor drop
/// their own `canManageUsers` through a role change. New users and their
/// roles are written in one step.

use super::crud::{parse_id, CrudController, CrudRequest, ItemsResponse};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        authorization::{forbid_self, require_permission, resolve_user_scope},
        middleware::CurrentUser,
        password::{hash_password, validate_password_strength},
    },
    models::{
        role::{permissions, roles},
        todo::TodoItem,
        user::{CreateUser, UpdateUser, User, UserStatus},
    },
    repository::{UserScope, Repositories},
};
use tracing::info;
use validator::Validate;

pub struct AdminUserController;

/// Body of `create`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserForm {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[serde(default)]
    pub status: UserStatus,

    /// Role names; the `user` role when empty
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Body of `update`; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserForm {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,

    pub status: Option<UserStatus>,

    /// Replaces the user's role set when present
    pub roles: Option<Vec<String>>,
}

/// `{"userId": [...]}` as returned by the to-do listing
#[derive(Debug, Serialize, Deserialize)]
pub struct UserTodoes {
    #[serde(rename = "userId")]
    pub items: Vec<TodoItem>,
}

/// Resolves the acting administrator and checks the permission
async fn acting_admin(req: &CrudRequest, permission: &str) -> ApiResult<UserScope> {
    let scope = req.define_user_repo()?;
    require_permission(&scope, permission).await?;
    Ok(scope)
}

fn checked_password_hash(password: &str) -> ApiResult<String> {
    validate_password_strength(password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })?;

    Ok(hash_password(password)?)
}

/// Rejects unknown role names before anything is written
async fn ensure_roles_exist(repos: &Repositories, names: &[String]) -> ApiResult<()> {
    for name in names {
        if repos.roles().find_by_name(name).await?.is_none() {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
                field: "roles".to_string(),
                message: format!("Unknown role: {name}"),
            }]));
        }
    }

    Ok(())
}

/// Rejects a role set that would strip the acting administrator of
/// `canManageUsers`
async fn forbid_self_demotion(
    repos: &Repositories,
    admin: &UserScope,
    target_id: i64,
    wanted: &[String],
) -> ApiResult<()> {
    if admin.user_id() != target_id {
        return Ok(());
    }

    let granted = repos
        .role_permissions()
        .list_role_permission_names(wanted)
        .await?;
    if !granted.iter().any(|p| p == permissions::CAN_MANAGE_USERS) {
        forbid_self(admin, target_id, "demote")?;
    }

    Ok(())
}

/// Makes the target's roles exactly `wanted`
async fn sync_roles(repos: &Repositories, target: &UserScope, wanted: &[String]) -> ApiResult<()> {
    for name in wanted {
        target.assign_role_if_not_exists(name).await?;
    }

    for role in repos.roles().all().await? {
        if !wanted.contains(&role.name) {
            target.unset_role_if_exists(&role.name).await?;
        }
    }

    Ok(())
}

#[async_trait]
impl CrudController for AdminUserController {
    const MOUNT_PATH: &'static str = "/admin/users";

    type Listed = User;
    type Item = User;

    async fn list(&self, req: CrudRequest) -> ApiResult<Vec<User>> {
        acting_admin(&req, permissions::CAN_MANAGE_USERS).await?;
        Ok(req.repos.users().all().await?)
    }

    async fn create(&self, req: CrudRequest) -> ApiResult<User> {
        let admin = acting_admin(&req, permissions::CAN_MANAGE_USERS).await?;
        let form: CreateUserForm = req.form()?;
        form.validate()?;

        let wanted = if form.roles.is_empty() {
            vec![roles::USER.to_string()]
        } else {
            form.roles
        };
        ensure_roles_exist(&req.repos, &wanted).await?;

        let password = checked_password_hash(&form.password)?;
        let user = req
            .repos
            .users()
            .create_with_roles(
                CreateUser {
                    name: form.name,
                    email: form.email,
                    password,
                    status: form.status,
                },
                &wanted,
            )
            .await?;

        info!(admin_id = admin.user_id(), user_id = user.id, "User created");
        Ok(user)
    }

    async fn update(&self, id: i64, req: CrudRequest) -> ApiResult<User> {
        let admin = acting_admin(&req, permissions::CAN_MANAGE_USERS).await?;
        let form: UpdateUserForm = req.form()?;
        form.validate()?;

        if form.status == Some(UserStatus::Blocked) {
            forbid_self(&admin, id, "block")?;
        }

        let target = resolve_user_scope(&req.repos, id).await?;
        if let Some(wanted) = &form.roles {
            ensure_roles_exist(&req.repos, wanted).await?;
            forbid_self_demotion(&req.repos, &admin, id, wanted).await?;
        }

        let attrs = UpdateUser {
            name: form.name,
            email: form.email,
            password: form
                .password
                .as_deref()
                .map(checked_password_hash)
                .transpose()?,
            status: form.status,
            deleted_at: None,
        };
        let user = req.repos.users().update(target.user_id(), &attrs).await?;

        if let Some(wanted) = &form.roles {
            sync_roles(&req.repos, &target, wanted).await?;
        }

        info!(admin_id = admin.user_id(), user_id = id, "User updated");
        Ok(user)
    }

    /// Soft delete
    async fn delete(&self, id: i64, req: CrudRequest) -> ApiResult<bool> {
        let admin = acting_admin(&req, permissions::CAN_MANAGE_USERS).await?;
        forbid_self(&admin, id, "delete")?;

        let target = resolve_user_scope(&req.repos, id).await?;
        let deleted = req.repos.users().delete(target.user_id()).await?;

        info!(admin_id = admin.user_id(), user_id = id, "User deleted");
        Ok(deleted)
    }

    fn custom_routes() -> Router<AppState> {
        Router::new().route("/todoes/:id", get(user_todoes))
    }
}

/// Another user's to-do items
async fn user_todoes(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> ApiResult<Json<ItemsResponse<UserTodoes>>> {
    let id = parse_id(&raw_id)?;

    let req = CrudRequest::new(user.map(|Extension(u)| u), state.repos.clone(), None);
    acting_admin(&req, permissions::CAN_MANAGE_USERS_TODOES).await?;

    let target = resolve_user_scope(&state.repos, id).await?;
    let items = target.get_todos().await?;

    Ok(Json(ItemsResponse {
        items: UserTodoes { items },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_todoes_uses_literal_user_id_key() {
        let json = serde_json::to_value(UserTodoes { items: vec![] }).unwrap();
        assert!(json.get("userId").unwrap().as_array().unwrap().is_empty());
    }

    #[test]
    fn test_create_form_defaults() {
        let form: CreateUserForm = serde_json::from_value(serde_json::json!({
            "name": "Jane",
            "email": "jane@example.com",
            "password": "secret123",
        }))
        .unwrap();

        assert_eq!(form.status, UserStatus::Active);
        assert!(form.roles.is_empty());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_weak_password_is_a_validation_error() {
        assert!(matches!(
            checked_password_hash("short"),
            Err(ApiError::ValidationError(_))
        ));
        assert!(checked_password_hash("longenough1").is_ok());
    }
}
