use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use tracing::debug;

use super::map_constraint;
use crate::models::todo::{CreateTodoItem, TodoItem, TodoStatus, UpdateTodoItem};
use crate::repository::{
    RepoResult, RepositoryError, TodoItemRepository, TodoStatusRepository,
};

const TODO_COLUMNS: &str =
    "id, description, planned_completion_at, created_at, updated_at, status_id, user_id";

const STATUS_COLUMNS: &str = "id, name, title, initial_default, position";

pub struct PgTodoItemRepository {
    pool: PgPool,
}

impl PgTodoItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn execute_todo_update<'e, E>(
    executor: E,
    id: i64,
    user_id: i64,
    attrs: &UpdateTodoItem,
) -> RepoResult<u64>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut query = String::from("UPDATE todo_items SET updated_at = NOW()");
    let mut bind_count = 2;

    if attrs.description.is_some() {
        bind_count += 1;
        query.push_str(&format!(", description = ${bind_count}"));
    }
    if attrs.planned_completion_at.is_some() {
        bind_count += 1;
        query.push_str(&format!(", planned_completion_at = ${bind_count}"));
    }
    if attrs.status_id.is_some() {
        bind_count += 1;
        query.push_str(&format!(", status_id = ${bind_count}"));
    }
    query.push_str(" WHERE id = $1 AND user_id = $2");

    let mut q = sqlx::query(&query).bind(id).bind(user_id);
    if let Some(description) = &attrs.description {
        q = q.bind(description.as_str());
    }
    if let Some(planned) = attrs.planned_completion_at {
        q = q.bind(planned);
    }
    if let Some(status_id) = attrs.status_id {
        q = q.bind(status_id);
    }

    let result = q
        .execute(executor)
        .await
        .map_err(|e| map_constraint(e, "Todo item conflict"))?;

    Ok(result.rows_affected())
}

#[async_trait]
impl TodoItemRepository for PgTodoItemRepository {
    async fn find_by_user_id(&self, user_id: i64) -> RepoResult<Vec<TodoItem>> {
        debug!(user_id, "Listing todo items");

        let items = sqlx::query_as::<_, TodoItem>(&format!(
            "SELECT {TODO_COLUMNS} FROM todo_items WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn find_user_todo(&self, id: i64, user_id: i64) -> RepoResult<Option<TodoItem>> {
        let item = sqlx::query_as::<_, TodoItem>(&format!(
            "SELECT {TODO_COLUMNS} FROM todo_items WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn create(&self, item: CreateTodoItem) -> RepoResult<TodoItem> {
        debug!(user_id = item.user_id, status_id = item.status_id, "Creating todo item");

        let created = sqlx::query_as::<_, TodoItem>(&format!(
            "INSERT INTO todo_items (description, planned_completion_at, status_id, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(&item.description)
        .bind(item.planned_completion_at)
        .bind(item.status_id)
        .bind(item.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "Todo item conflict"))?;

        Ok(created)
    }

    async fn apply_update(
        &self,
        id: i64,
        user_id: i64,
        attrs: &UpdateTodoItem,
    ) -> RepoResult<bool> {
        Ok(execute_todo_update(&self.pool, id, user_id, attrs).await? > 0)
    }

    async fn update(&self, id: i64, user_id: i64, attrs: &UpdateTodoItem) -> RepoResult<TodoItem> {
        debug!(todo_id = id, user_id, "Updating todo item");

        let mut tx = self.pool.begin().await?;

        if execute_todo_update(&mut *tx, id, user_id, attrs).await? == 0 {
            return Err(RepositoryError::NotFound("Todo item not found".into()));
        }

        let item = sqlx::query_as::<_, TodoItem>(&format!(
            "SELECT {TODO_COLUMNS} FROM todo_items WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            RepositoryError::Consistency(format!("Todo item {id} vanished after update"))
        })?;

        tx.commit().await?;
        Ok(item)
    }

    async fn delete(&self, id: i64, user_id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM todo_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct PgTodoStatusRepository {
    pool: PgPool,
}

impl PgTodoStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoStatusRepository for PgTodoStatusRepository {
    async fn all(&self) -> RepoResult<Vec<TodoStatus>> {
        let statuses = sqlx::query_as::<_, TodoStatus>(&format!(
            "SELECT {STATUS_COLUMNS} FROM todo_statuses ORDER BY position, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(statuses)
    }

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<TodoStatus>> {
        let status = sqlx::query_as::<_, TodoStatus>(&format!(
            "SELECT {STATUS_COLUMNS} FROM todo_statuses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    async fn initial_default(&self) -> RepoResult<Option<TodoStatus>> {
        let status = sqlx::query_as::<_, TodoStatus>(&format!(
            "SELECT {STATUS_COLUMNS} FROM todo_statuses WHERE initial_default LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }
}
