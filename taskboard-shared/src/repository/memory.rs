/// In-process repositories
///
/// [`MemoryStore`] keeps every table behind one `tokio::sync::RwLock` and
/// implements all repository traits, mirroring the PostgreSQL constraints
/// that matter to callers (unique email, status and owner references,
/// ownership filters). [`MemoryStore::seeded`] loads the same roles,
/// permissions and statuses as the initial migration.
///
/// Update-then-read is two lock acquisitions here, not a transaction.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use super::{
    HealthCheckRepository, RepoResult, RepositoryError, RolePermissionsRepository,
    RoleRepository, TodoItemRepository, TodoStatusRepository, UserRepository,
    UsersRoleRepository,
};
use crate::models::role::{permissions, roles, Permission, Role};
use crate::models::todo::{CreateTodoItem, TodoItem, TodoStatus, UpdateTodoItem};
use crate::models::user::{CreateUser, UpdateUser, User};

const EMAIL_TAKEN: &str = "Email is already registered";

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    todo_items: BTreeMap<i64, TodoItem>,
    statuses: Vec<TodoStatus>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    users_roles: BTreeSet<(i64, i32)>,
    role_permissions: BTreeSet<(i32, i32)>,
    last_user_id: i64,
    last_todo_id: i64,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// All tables in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Empty store with no roles, permissions or statuses
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the reference data of the initial migration
    pub fn seeded() -> Self {
        let status = |id: i32, name: &str, title: &str, position: i32| TodoStatus {
            id,
            name: name.to_string(),
            title: title.to_string(),
            initial_default: id == 1,
            position,
        };

        let tables = Tables {
            statuses: vec![
                status(1, "new", "New", 1),
                status(2, "in_progress", "In progress", 2),
                status(3, "done", "Done", 3),
            ],
            roles: vec![
                Role {
                    id: 1,
                    name: roles::ADMIN.to_string(),
                    title: "Administrator".to_string(),
                },
                Role {
                    id: 2,
                    name: roles::USER.to_string(),
                    title: "User".to_string(),
                },
            ],
            permissions: vec![
                Permission {
                    id: 1,
                    name: permissions::CAN_MANAGE_USERS.to_string(),
                },
                Permission {
                    id: 2,
                    name: permissions::CAN_MANAGE_USERS_TODOES.to_string(),
                },
            ],
            role_permissions: [(1, 1), (1, 2)].into_iter().collect(),
            ..Default::default()
        };

        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Physically removes a user row and everything hanging off it
    pub async fn purge_user(&self, id: i64) -> bool {
        let mut tables = self.tables.write().await;
        tables.todo_items.retain(|_, item| item.user_id != id);
        tables.users_roles.retain(|(user_id, _)| *user_id != id);
        tables.users.remove(&id).is_some()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn all(&self) -> RepoResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn all_existing(&self) -> RepoResult<Vec<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .filter(|u| !u.is_deleted())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64, with_trashed: bool) -> RepoResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .get(&id)
            .filter(|u| with_trashed || !u.is_deleted())
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email && !u.is_deleted())
            .cloned())
    }

    async fn create(&self, user: CreateUser) -> RepoResult<User> {
        self.create_with_roles(user, &[]).await
    }

    /// Role names are resolved before the user row is inserted, under one
    /// write lock
    async fn create_with_roles(&self, user: CreateUser, role_names: &[String]) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict(EMAIL_TAKEN.into()));
        }

        let role_ids = role_names
            .iter()
            .map(|name| {
                tables
                    .roles
                    .iter()
                    .find(|r| &r.name == name)
                    .map(|r| r.id)
                    .ok_or_else(|| RepositoryError::InvalidReference(format!("Unknown role {name}")))
            })
            .collect::<RepoResult<Vec<i32>>>()?;

        tables.last_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: tables.last_user_id,
            name: user.name,
            email: user.email,
            password: user.password,
            status: user.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.insert(created.id, created.clone());
        for role_id in role_ids {
            tables.users_roles.insert((created.id, role_id));
        }

        Ok(created)
    }

    async fn apply_update(&self, id: i64, attrs: &UpdateUser) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &attrs.email {
            if tables.email_taken(email, Some(id)) {
                return Err(RepositoryError::Conflict(EMAIL_TAKEN.into()));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(false);
        };

        if let Some(name) = &attrs.name {
            user.name = name.clone();
        }
        if let Some(email) = &attrs.email {
            user.email = email.clone();
        }
        if let Some(password) = &attrs.password {
            user.password = password.clone();
        }
        if let Some(status) = attrs.status {
            user.status = status;
        }
        if let Some(deleted_at) = attrs.deleted_at {
            user.deleted_at = deleted_at;
        }
        user.updated_at = Utc::now();

        Ok(true)
    }
}

#[async_trait]
impl TodoItemRepository for MemoryStore {
    async fn find_by_user_id(&self, user_id: i64) -> RepoResult<Vec<TodoItem>> {
        Ok(self
            .tables
            .read()
            .await
            .todo_items
            .values()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_user_todo(&self, id: i64, user_id: i64) -> RepoResult<Option<TodoItem>> {
        Ok(self
            .tables
            .read()
            .await
            .todo_items
            .get(&id)
            .filter(|item| item.user_id == user_id)
            .cloned())
    }

    async fn create(&self, item: CreateTodoItem) -> RepoResult<TodoItem> {
        let mut tables = self.tables.write().await;
        if !tables.statuses.iter().any(|s| s.id == item.status_id) {
            return Err(RepositoryError::InvalidReference(format!(
                "Unknown todo status {}",
                item.status_id
            )));
        }
        if !tables.users.contains_key(&item.user_id) {
            return Err(RepositoryError::InvalidReference(format!(
                "Unknown user {}",
                item.user_id
            )));
        }

        tables.last_todo_id += 1;
        let now = Utc::now();
        let created = TodoItem {
            id: tables.last_todo_id,
            description: item.description,
            planned_completion_at: item.planned_completion_at,
            created_at: now,
            updated_at: now,
            status_id: item.status_id,
            user_id: item.user_id,
        };
        tables.todo_items.insert(created.id, created.clone());

        Ok(created)
    }

    async fn apply_update(
        &self,
        id: i64,
        user_id: i64,
        attrs: &UpdateTodoItem,
    ) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if let Some(status_id) = attrs.status_id {
            if !tables.statuses.iter().any(|s| s.id == status_id) {
                return Err(RepositoryError::InvalidReference(format!(
                    "Unknown todo status {status_id}"
                )));
            }
        }

        let Some(item) = tables
            .todo_items
            .get_mut(&id)
            .filter(|item| item.user_id == user_id)
        else {
            return Ok(false);
        };

        if let Some(description) = &attrs.description {
            item.description = description.clone();
        }
        if let Some(planned) = attrs.planned_completion_at {
            item.planned_completion_at = planned;
        }
        if let Some(status_id) = attrs.status_id {
            item.status_id = status_id;
        }
        item.updated_at = Utc::now();

        Ok(true)
    }

    async fn delete(&self, id: i64, user_id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .todo_items
            .get(&id)
            .map(|item| item.user_id == user_id)
            .unwrap_or(false);

        Ok(owned && tables.todo_items.remove(&id).is_some())
    }
}

#[async_trait]
impl TodoStatusRepository for MemoryStore {
    async fn all(&self) -> RepoResult<Vec<TodoStatus>> {
        let mut statuses = self.tables.read().await.statuses.clone();
        statuses.sort_by_key(|s| (s.position, s.id));
        Ok(statuses)
    }

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<TodoStatus>> {
        Ok(self
            .tables
            .read()
            .await
            .statuses
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn initial_default(&self) -> RepoResult<Option<TodoStatus>> {
        Ok(self
            .tables
            .read()
            .await
            .statuses
            .iter()
            .find(|s| s.initial_default)
            .cloned())
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn all(&self) -> RepoResult<Vec<Role>> {
        Ok(self.tables.read().await.roles.clone())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        Ok(self
            .tables
            .read()
            .await
            .roles
            .iter()
            .find(|r| r.name == name)
            .cloned())
    }
}

#[async_trait]
impl UsersRoleRepository for MemoryStore {
    async fn has_roles(&self, user_id: i64) -> RepoResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .users_roles
            .iter()
            .any(|(uid, _)| *uid == user_id))
    }

    async fn has_role(&self, user_id: i64, role_id: i32) -> RepoResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .users_roles
            .contains(&(user_id, role_id)))
    }

    async fn assign_role(&self, user_id: i64, role_id: i32) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.roles.iter().any(|r| r.id == role_id) {
            return Err(RepositoryError::InvalidReference(format!("Unknown role {role_id}")));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::InvalidReference(format!("Unknown user {user_id}")));
        }

        tables.users_roles.insert((user_id, role_id));
        Ok(())
    }

    async fn unset_role(&self, user_id: i64, role_id: i32) -> RepoResult<bool> {
        Ok(self
            .tables
            .write()
            .await
            .users_roles
            .remove(&(user_id, role_id)))
    }

    async fn user_role_names(&self, user_id: i64) -> RepoResult<Vec<String>> {
        let tables = self.tables.read().await;
        let mut names: Vec<String> = tables
            .users_roles
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .filter_map(|(_, role_id)| tables.roles.iter().find(|r| r.id == *role_id))
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl RolePermissionsRepository for MemoryStore {
    async fn list_role_permission_names(&self, role_names: &[String]) -> RepoResult<Vec<String>> {
        let tables = self.tables.read().await;
        let role_ids: BTreeSet<i32> = tables
            .roles
            .iter()
            .filter(|r| role_names.contains(&r.name))
            .map(|r| r.id)
            .collect();

        let names: BTreeSet<String> = tables
            .role_permissions
            .iter()
            .filter(|(role_id, _)| role_ids.contains(role_id))
            .filter_map(|(_, permission_id)| {
                tables.permissions.iter().find(|p| p.id == *permission_id)
            })
            .map(|p| p.name.clone())
            .collect();

        Ok(names.into_iter().collect())
    }
}

#[async_trait]
impl HealthCheckRepository for MemoryStore {
    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserStatus;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password: "hash".to_string(),
            status: UserStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::seeded();
        UserRepository::create(&store, new_user("a@example.com"))
            .await
            .unwrap();

        let err = UserRepository::create(&store, new_user("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_soft_deleted_user_hidden_unless_trashed() {
        let store = MemoryStore::seeded();
        let user = UserRepository::create(&store, new_user("a@example.com"))
            .await
            .unwrap();

        assert!(UserRepository::delete(&store, user.id).await.unwrap());

        assert!(UserRepository::find_by_id(&store, user.id, false)
            .await
            .unwrap()
            .is_none());
        let trashed = UserRepository::find_by_id(&store, user.id, true)
            .await
            .unwrap()
            .unwrap();
        assert!(trashed.is_deleted());

        assert!(store.find_by_email("a@example.com").await.unwrap().is_none());
        assert_eq!(store.all_existing().await.unwrap().len(), 0);
        assert_eq!(UserRepository::all(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_with_roles_assigns_roles() {
        let store = MemoryStore::seeded();
        let user = store
            .create_with_roles(new_user("a@example.com"), &[roles::ADMIN.to_string()])
            .await
            .unwrap();

        assert_eq!(
            store.user_role_names(user.id).await.unwrap(),
            vec![roles::ADMIN.to_string()]
        );
    }

    #[tokio::test]
    async fn test_create_with_unknown_role_leaves_no_user() {
        let store = MemoryStore::seeded();
        let wanted = vec![roles::USER.to_string(), "ghost".to_string()];

        let err = store
            .create_with_roles(new_user("a@example.com"), &wanted)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidReference(_)));
        assert!(UserRepository::all(&store).await.unwrap().is_empty());

        // the email is still free
        let user = store
            .create_with_roles(new_user("a@example.com"), &[roles::USER.to_string()])
            .await
            .unwrap();
        assert!(store.has_roles(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let store = MemoryStore::seeded();
        let err = UserRepository::update(&store, 42, &UpdateUser::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_set_active_state() {
        let store = MemoryStore::seeded();
        let user = UserRepository::create(&store, new_user("a@example.com"))
            .await
            .unwrap();

        let blocked = store.set_active_state(user.id, false).await.unwrap();
        assert!(blocked.is_blocked());
        assert!(store.is_blocked(user.id).await.unwrap());

        store.set_active_state(user.id, true).await.unwrap();
        assert!(store.is_active(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_todo_delete_is_ownership_aware() {
        let store = MemoryStore::seeded();
        let owner = UserRepository::create(&store, new_user("a@example.com"))
            .await
            .unwrap();
        let other = UserRepository::create(&store, new_user("b@example.com"))
            .await
            .unwrap();

        let item = TodoItemRepository::create(
            &store,
            CreateTodoItem {
                description: "write tests".to_string(),
                planned_completion_at: None,
                status_id: 1,
                user_id: owner.id,
            },
        )
        .await
        .unwrap();

        assert!(!TodoItemRepository::delete(&store, item.id, other.id)
            .await
            .unwrap());
        assert!(store.find_user_todo(item.id, owner.id).await.unwrap().is_some());

        assert!(TodoItemRepository::delete(&store, item.id, owner.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_permissions_union_over_roles() {
        let store = MemoryStore::seeded();

        let names = store
            .list_role_permission_names(&["admin".to_string(), "user".to_string()])
            .await
            .unwrap();
        assert_eq!(names, vec!["canManageUsers", "canManageUsersTodoes"]);

        let names = store
            .list_role_permission_names(&["user".to_string()])
            .await
            .unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_purge_user_removes_dependents() {
        let store = MemoryStore::seeded();
        let user = UserRepository::create(&store, new_user("a@example.com"))
            .await
            .unwrap();
        store.assign_role(user.id, 2).await.unwrap();

        assert!(store.purge_user(user.id).await);
        assert!(!store.has_roles(user.id).await.unwrap());
        assert!(UserRepository::find_by_id(&store, user.id, true)
            .await
            .unwrap()
            .is_none());
    }
}
