use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use tracing::debug;

use super::map_constraint;
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repository::{RepoResult, RepositoryError, UserRepository};

const USER_COLUMNS: &str =
    "id, name, email, password, status, created_at, updated_at, deleted_at";

const EMAIL_TAKEN: &str = "Email is already registered";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Runs the dynamic `UPDATE users` for `attrs`, returning affected rows
async fn execute_user_update<'e, E>(executor: E, id: i64, attrs: &UpdateUser) -> RepoResult<u64>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut query = String::from("UPDATE users SET updated_at = NOW()");
    let mut bind_count = 1;

    if attrs.name.is_some() {
        bind_count += 1;
        query.push_str(&format!(", name = ${bind_count}"));
    }
    if attrs.email.is_some() {
        bind_count += 1;
        query.push_str(&format!(", email = ${bind_count}"));
    }
    if attrs.password.is_some() {
        bind_count += 1;
        query.push_str(&format!(", password = ${bind_count}"));
    }
    if attrs.status.is_some() {
        bind_count += 1;
        query.push_str(&format!(", status = ${bind_count}"));
    }
    if attrs.deleted_at.is_some() {
        bind_count += 1;
        query.push_str(&format!(", deleted_at = ${bind_count}"));
    }
    query.push_str(" WHERE id = $1");

    let mut q = sqlx::query(&query).bind(id);
    if let Some(name) = &attrs.name {
        q = q.bind(name.as_str());
    }
    if let Some(email) = &attrs.email {
        q = q.bind(email.as_str());
    }
    if let Some(password) = &attrs.password {
        q = q.bind(password.as_str());
    }
    if let Some(status) = attrs.status {
        q = q.bind(status);
    }
    if let Some(deleted_at) = attrs.deleted_at {
        q = q.bind(deleted_at);
    }

    let result = q
        .execute(executor)
        .await
        .map_err(|e| map_constraint(e, EMAIL_TAKEN))?;

    Ok(result.rows_affected())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn all(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn all_existing(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_by_id(&self, id: i64, with_trashed: bool) -> RepoResult<Option<User>> {
        debug!(user_id = id, with_trashed, "Finding user by id");

        let filter = if with_trashed {
            ""
        } else {
            " AND deleted_at IS NULL"
        };
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1{filter}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: CreateUser) -> RepoResult<User> {
        debug!(email = %user.email, "Creating user");

        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, EMAIL_TAKEN))?;

        Ok(created)
    }

    /// User insert and role assignments share one transaction
    async fn create_with_roles(&self, user: CreateUser, role_names: &[String]) -> RepoResult<User> {
        debug!(email = %user.email, roles = ?role_names, "Creating user with roles");

        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, EMAIL_TAKEN))?;

        for name in role_names {
            let assigned = sqlx::query(
                "INSERT INTO users_roles (user_id, role_id)
                 SELECT $1, id FROM roles WHERE name = $2
                 ON CONFLICT DO NOTHING",
            )
            .bind(created.id)
            .bind(name)
            .execute(&mut *tx)
            .await?;

            if assigned.rows_affected() == 0
                && !sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM roles WHERE name = $1)")
                    .bind(name)
                    .fetch_one(&mut *tx)
                    .await?
            {
                return Err(RepositoryError::InvalidReference(format!("Unknown role {name}")));
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn apply_update(&self, id: i64, attrs: &UpdateUser) -> RepoResult<bool> {
        Ok(execute_user_update(&self.pool, id, attrs).await? > 0)
    }

    /// Write and read-back share one transaction
    async fn update(&self, id: i64, attrs: &UpdateUser) -> RepoResult<User> {
        debug!(user_id = id, "Updating user");

        let mut tx = self.pool.begin().await?;

        if execute_user_update(&mut *tx, id, attrs).await? == 0 {
            return Err(RepositoryError::NotFound("User not found".into()));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::Consistency(format!("User {id} vanished after update")))?;

        tx.commit().await?;
        Ok(user)
    }
}
