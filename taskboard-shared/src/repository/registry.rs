use sqlx::PgPool;
use std::sync::Arc;

use super::memory::MemoryStore;
use super::postgres::{
    PgHealthCheckRepository, PgRolePermissionsRepository, PgRoleRepository,
    PgTodoItemRepository, PgTodoStatusRepository, PgUserRepository, PgUsersRoleRepository,
};
use super::{
    HealthCheckRepository, RepoResult, RolePermissionsRepository, RoleRepository,
    TodoItemRepository, TodoStatusRepository, UserRepository, UserScope, UsersRoleRepository,
};

/// One implementation of every repository trait
///
/// Cheap to clone; handlers receive it through the application state.
#[derive(Clone)]
pub struct Repositories {
    users: Arc<dyn UserRepository>,
    todo_items: Arc<dyn TodoItemRepository>,
    todo_statuses: Arc<dyn TodoStatusRepository>,
    roles: Arc<dyn RoleRepository>,
    users_roles: Arc<dyn UsersRoleRepository>,
    role_permissions: Arc<dyn RolePermissionsRepository>,
    health: Arc<dyn HealthCheckRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            todo_items: Arc::new(PgTodoItemRepository::new(pool.clone())),
            todo_statuses: Arc::new(PgTodoStatusRepository::new(pool.clone())),
            roles: Arc::new(PgRoleRepository::new(pool.clone())),
            users_roles: Arc::new(PgUsersRoleRepository::new(pool.clone())),
            role_permissions: Arc::new(PgRolePermissionsRepository::new(pool.clone())),
            health: Arc::new(PgHealthCheckRepository::new(pool)),
        }
    }

    /// Repositories over a fresh seeded [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::seeded()))
    }

    /// Repositories over an existing store, so tests can keep a handle to it
    pub fn from_store(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            todo_items: store.clone(),
            todo_statuses: store.clone(),
            roles: store.clone(),
            users_roles: store.clone(),
            role_permissions: store.clone(),
            health: store,
        }
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    pub fn todo_items(&self) -> Arc<dyn TodoItemRepository> {
        self.todo_items.clone()
    }

    pub fn todo_statuses(&self) -> Arc<dyn TodoStatusRepository> {
        self.todo_statuses.clone()
    }

    pub fn roles(&self) -> Arc<dyn RoleRepository> {
        self.roles.clone()
    }

    pub fn users_roles(&self) -> Arc<dyn UsersRoleRepository> {
        self.users_roles.clone()
    }

    pub fn role_permissions(&self) -> Arc<dyn RolePermissionsRepository> {
        self.role_permissions.clone()
    }

    pub fn health(&self) -> Arc<dyn HealthCheckRepository> {
        self.health.clone()
    }

    /// Scope for a non-deleted user, or `None` if the id does not resolve
    pub async fn user_scope(&self, user_id: i64) -> RepoResult<Option<UserScope>> {
        Ok(self
            .users
            .find_by_id(user_id, false)
            .await?
            .map(|user| UserScope::new(user, self.clone())))
    }
}
