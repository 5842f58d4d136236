/// To-do item and status models
///
/// # Schema
///
/// ```sql
/// CREATE TABLE todo_statuses (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(64) NOT NULL UNIQUE,
///     title VARCHAR(255) NOT NULL,
///     initial_default BOOLEAN NOT NULL DEFAULT FALSE,
///     position INTEGER NOT NULL DEFAULT 0
/// );
///
/// CREATE TABLE todo_items (
///     id BIGSERIAL PRIMARY KEY,
///     description TEXT NOT NULL DEFAULT '',
///     planned_completion_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     status_id INTEGER NOT NULL REFERENCES todo_statuses(id),
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// );
/// ```
///
/// Items are only ever read or written through a
/// [`UserScope`](crate::repository::UserScope) built for their owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Status a to-do item can be in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoStatus {
    pub id: i32,

    /// Machine name (e.g. `in_progress`)
    pub name: String,

    pub title: String,

    /// Status given to new items that do not name one
    pub initial_default: bool,

    /// Display order, ascending
    pub position: i32,
}

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: i64,

    pub description: String,

    pub planned_completion_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub status_id: i32,

    /// Owning user
    pub user_id: i64,
}

/// Item fields supplied by a client
///
/// Carries no owner: the owner is injected by the user scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemForm {
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    #[serde(default)]
    pub description: String,

    pub planned_completion_at: Option<DateTime<Utc>>,

    /// Falls back to the initial default status when absent
    pub status_id: Option<i32>,
}

/// Input for inserting an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoItem {
    pub description: String,

    pub planned_completion_at: Option<DateTime<Utc>>,

    pub status_id: i32,

    pub user_id: i64,
}

/// Input for updating an item
///
/// Only `Some` fields are written; `Some(None)` clears the planned date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoItem {
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default, with = "double_option")]
    pub planned_completion_at: Option<Option<DateTime<Utc>>>,

    pub status_id: Option<i32>,
}

impl UpdateTodoItem {
    /// Status-only update
    pub fn status(status_id: i32) -> Self {
        Self {
            status_id: Some(status_id),
            ..Default::default()
        }
    }
}

/// Items of one status, as shown in a list column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStatusGroup {
    pub status: TodoStatus,

    pub items: Vec<TodoItem>,
}

impl TodoStatusGroup {
    /// Groups items under their statuses
    ///
    /// Produces one group per status, ordered by `position` then `id`,
    /// including statuses with no items. Items keep their relative order.
    /// Items pointing at an unknown status are dropped.
    pub fn group(mut statuses: Vec<TodoStatus>, items: Vec<TodoItem>) -> Vec<TodoStatusGroup> {
        statuses.sort_by_key(|status| (status.position, status.id));

        let mut groups: Vec<TodoStatusGroup> = statuses
            .into_iter()
            .map(|status| TodoStatusGroup {
                status,
                items: Vec::new(),
            })
            .collect();

        for item in items {
            if let Some(group) = groups.iter_mut().find(|g| g.status.id == item.status_id) {
                group.items.push(item);
            }
        }

        groups
    }
}

/// Distinguishes an absent field from an explicit `null`
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
