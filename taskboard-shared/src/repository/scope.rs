use std::fmt;
use tracing::debug;

use super::{RepoResult, RepositoryError, Repositories};
use crate::models::todo::{
    CreateTodoItem, TodoItem, TodoItemForm, TodoStatusGroup, UpdateTodoItem,
};
use crate::models::user::User;

/// Repository view bound to one user
///
/// Every to-do and role operation injects the held user's id, so items of
/// other users can be neither read nor modified through a scope. Scopes
/// are built per request and never cached.
#[derive(Clone)]
pub struct UserScope {
    user: User,
    repos: Repositories,
}

impl fmt::Debug for UserScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserScope")
            .field("user_id", &self.user.id)
            .finish_non_exhaustive()
    }
}

impl UserScope {
    pub fn new(user: User, repos: Repositories) -> Self {
        Self { user, repos }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn into_user(self) -> User {
        self.user
    }

    /// The user's items ordered by id
    pub async fn get_todos(&self) -> RepoResult<Vec<TodoItem>> {
        self.repos.todo_items().find_by_user_id(self.user.id).await
    }

    /// The user's items grouped by status, one group per status
    pub async fn get_todos_by_status_groups(&self) -> RepoResult<Vec<TodoStatusGroup>> {
        let statuses = self.repos.todo_statuses().all().await?;
        let items = self.get_todos().await?;

        Ok(TodoStatusGroup::group(statuses, items))
    }

    /// Creates an item owned by the user
    ///
    /// Without a `status_id` the item gets the initial default status.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::InvalidReference`] if the status does not exist.
    pub async fn add_todo_item(&self, form: TodoItemForm) -> RepoResult<TodoItem> {
        let statuses = self.repos.todo_statuses();

        let status_id = match form.status_id {
            Some(status_id) => {
                self.ensure_status_exists(status_id).await?;
                status_id
            }
            None => {
                statuses
                    .initial_default()
                    .await?
                    .ok_or_else(|| {
                        RepositoryError::Consistency("No initial default todo status".into())
                    })?
                    .id
            }
        };

        debug!(user_id = self.user.id, status_id, "Adding todo item");

        self.repos
            .todo_items()
            .create(CreateTodoItem {
                description: form.description,
                planned_completion_at: form.planned_completion_at,
                status_id,
                user_id: self.user.id,
            })
            .await
    }

    pub async fn find_todo_by_id(&self, id: i64) -> RepoResult<Option<TodoItem>> {
        self.repos.todo_items().find_user_todo(id, self.user.id).await
    }

    /// Updates one of the user's items
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] if the item is not the user's
    /// - [`RepositoryError::InvalidReference`] for an unknown status
    pub async fn update_todo_item(&self, id: i64, attrs: &UpdateTodoItem) -> RepoResult<TodoItem> {
        if let Some(status_id) = attrs.status_id {
            self.ensure_status_exists(status_id).await?;
        }

        self.repos
            .todo_items()
            .update(id, self.user.id, attrs)
            .await
    }

    /// Moves an item to any existing status
    pub async fn set_todo_status(&self, id: i64, status_id: i32) -> RepoResult<TodoItem> {
        self.update_todo_item(id, &UpdateTodoItem::status(status_id))
            .await
    }

    /// Deletes one of the user's items
    ///
    /// Returns `false`, leaving the row alone, for items of other users.
    pub async fn delete_todo_item(&self, id: i64) -> RepoResult<bool> {
        self.repos.todo_items().delete(id, self.user.id).await
    }

    async fn ensure_status_exists(&self, status_id: i32) -> RepoResult<()> {
        match self.repos.todo_statuses().find_by_id(status_id).await? {
            Some(_) => Ok(()),
            None => Err(RepositoryError::InvalidReference(format!(
                "Unknown todo status {status_id}"
            ))),
        }
    }

    pub async fn has_roles(&self) -> RepoResult<bool> {
        self.repos.users_roles().has_roles(self.user.id).await
    }

    pub async fn role_names(&self) -> RepoResult<Vec<String>> {
        self.repos.users_roles().user_role_names(self.user.id).await
    }

    /// Assigns the named role
    ///
    /// # Errors
    ///
    /// [`RepositoryError::InvalidReference`] for an unknown role name.
    pub async fn assign_role(&self, role_name: &str) -> RepoResult<()> {
        let role_id = self.role_id(role_name).await?;
        self.repos
            .users_roles()
            .assign_role(self.user.id, role_id)
            .await
    }

    /// Assigns the named role unless held; returns whether it was added
    pub async fn assign_role_if_not_exists(&self, role_name: &str) -> RepoResult<bool> {
        let role_id = self.role_id(role_name).await?;
        let users_roles = self.repos.users_roles();

        if users_roles.has_role(self.user.id, role_id).await? {
            return Ok(false);
        }

        users_roles.assign_role(self.user.id, role_id).await?;
        Ok(true)
    }

    /// Removes the named role if held; returns whether it was removed
    ///
    /// Unknown role names are treated as not held.
    pub async fn unset_role_if_exists(&self, role_name: &str) -> RepoResult<bool> {
        match self.repos.roles().find_by_name(role_name).await? {
            Some(role) => {
                self.repos
                    .users_roles()
                    .unset_role(self.user.id, role.id)
                    .await
            }
            None => Ok(false),
        }
    }

    async fn role_id(&self, role_name: &str) -> RepoResult<i32> {
        self.repos
            .roles()
            .find_by_name(role_name)
            .await?
            .map(|role| role.id)
            .ok_or_else(|| RepositoryError::InvalidReference(format!("Unknown role {role_name}")))
    }

    /// Names of every permission granted through the user's roles
    ///
    /// Empty without touching the permission tables when the user holds no
    /// role. Otherwise de-duplicated and sorted.
    pub async fn get_permission_names(&self) -> RepoResult<Vec<String>> {
        if !self.has_roles().await? {
            return Ok(Vec::new());
        }

        let role_names = self.role_names().await?;
        self.repos
            .role_permissions()
            .list_role_permission_names(&role_names)
            .await
    }

    pub async fn has_permission(&self, permission: &str) -> RepoResult<bool> {
        Ok(self
            .get_permission_names()
            .await?
            .iter()
            .any(|name| name == permission))
    }
}
