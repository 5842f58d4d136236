use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::role::Role;
use crate::repository::{
    RepoResult, RolePermissionsRepository, RoleRepository, UsersRoleRepository,
};

pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn all(&self) -> RepoResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name, title FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name, title FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }
}

pub struct PgUsersRoleRepository {
    pool: PgPool,
}

impl PgUsersRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRoleRepository for PgUsersRoleRepository {
    async fn has_roles(&self, user_id: i64) -> RepoResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users_roles WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn has_role(&self, user_id: i64, role_id: i32) -> RepoResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users_roles WHERE user_id = $1 AND role_id = $2)",
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn assign_role(&self, user_id: i64, role_id: i32) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO users_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|e| super::map_constraint(e, "Role already assigned"))?;

        Ok(())
    }

    async fn unset_role(&self, user_id: i64, role_id: i32) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM users_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn user_role_names(&self, user_id: i64) -> RepoResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT r.name FROM roles r
             JOIN users_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = $1
             ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}

pub struct PgRolePermissionsRepository {
    pool: PgPool,
}

impl PgRolePermissionsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RolePermissionsRepository for PgRolePermissionsRepository {
    async fn list_role_permission_names(&self, role_names: &[String]) -> RepoResult<Vec<String>> {
        if role_names.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT p.name FROM permissions p
             JOIN role_permissions rp ON rp.permission_id = p.id
             JOIN roles r ON r.id = rp.role_id
             WHERE r.name = ANY($1)
             ORDER BY p.name",
        )
        .bind(role_names.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}
