/// Role and permission models
///
/// Roles group permissions; users hold roles through `users_roles` and
/// roles map to permissions through `role_permissions`. A user's
/// effective permissions are the union over all of their roles.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (id SERIAL PRIMARY KEY, name VARCHAR(64) UNIQUE, title VARCHAR(255));
/// CREATE TABLE permissions (id SERIAL PRIMARY KEY, name VARCHAR(128) UNIQUE);
/// CREATE TABLE users_roles (user_id BIGINT, role_id INTEGER, PRIMARY KEY (user_id, role_id));
/// CREATE TABLE role_permissions (role_id INTEGER, permission_id INTEGER, PRIMARY KEY (role_id, permission_id));
/// ```

use serde::{Deserialize, Serialize};

/// Named permission group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i32,

    /// Machine name (e.g. `admin`)
    pub name: String,

    /// Human-readable title
    pub title: String,
}

/// Named capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: i32,

    pub name: String,
}

/// Role names seeded by the initial migration
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const USER: &str = "user";
}

/// Permission names seeded by the initial migration
pub mod permissions {
    /// List, create, update and delete other users
    pub const CAN_MANAGE_USERS: &str = "canManageUsers";

    /// Read other users' to-do items
    pub const CAN_MANAGE_USERS_TODOES: &str = "canManageUsersTodoes";
}
