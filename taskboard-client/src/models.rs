/// Wire models of the Taskboard API, as seen by the client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder shown for an item without a description
pub const EMPTY_DESCRIPTION: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStatus {
    pub id: i32,

    pub name: String,

    pub title: String,

    pub initial_default: bool,

    pub position: i32,
}

/// A to-do card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: i64,

    pub description: String,

    pub planned_completion_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub status_id: i32,

    pub user_id: i64,
}

impl TodoItem {
    /// The description, or `default` when it is empty
    pub fn description_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.description.is_empty() {
            default
        } else {
            &self.description
        }
    }
}

/// One list column: a status and its cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoGroup {
    pub status: TodoStatus,

    pub items: Vec<TodoItem>,
}

impl TodoGroup {
    /// Every card of every group, in column order
    pub fn cards(groups: &[TodoGroup]) -> Vec<TodoItem> {
        groups
            .iter()
            .flat_map(|group| group.items.iter().cloned())
            .collect()
    }
}

/// Body of a card create
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoForm {
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_completion_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i32>,
}

/// A user as listed by the administration endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    pub name: String,

    pub email: String,

    /// `active` or `blocked`
    pub status: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub deleted_at: Option<DateTime<Utc>>,
}

/// Body of an administrator's user create
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,

    pub email: String,

    pub password: String,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,

    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: i64,

    pub name: String,

    pub email: String,

    pub access_token: String,

    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// `{"items": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResponse<T> {
    pub items: T,
}

/// `{"item": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    pub item: T,
}

/// `{"success": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `{"form": ...}` wrapper of create and update bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormRequest<T> {
    pub form: T,
}

/// Error body returned by the server
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    pub message: String,
}

/// `{"userId": [...]}` of the administrator's to-do listing
#[derive(Debug, Clone, Deserialize)]
pub struct UserTodoes {
    #[serde(rename = "userId")]
    pub items: Vec<TodoItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(status_id: i32, item_ids: &[i64]) -> serde_json::Value {
        json!({
            "status": {
                "id": status_id,
                "name": format!("s{status_id}"),
                "title": format!("S{status_id}"),
                "initialDefault": status_id == 1,
                "position": status_id,
            },
            "items": item_ids.iter().map(|id| json!({
                "id": id,
                "description": "",
                "plannedCompletionAt": null,
                "createdAt": "2025-01-01T00:00:00Z",
                "updatedAt": "2025-01-01T00:00:00Z",
                "statusId": status_id,
                "userId": 1,
            })).collect::<Vec<_>>(),
        })
    }

    #[test]
    fn test_cards_flatten_groups_in_order() {
        let groups: Vec<TodoGroup> =
            serde_json::from_value(json!([group(1, &[3]), group(2, &[]), group(3, &[1, 2])]))
                .unwrap();

        let ids: Vec<i64> = TodoGroup::cards(&groups).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_description_or_default() {
        let groups: Vec<TodoGroup> = serde_json::from_value(json!([group(1, &[1])])).unwrap();
        let mut card = groups[0].items[0].clone();
        assert_eq!(card.description_or(EMPTY_DESCRIPTION), "Not specified");

        card.description = "Buy milk".to_string();
        assert_eq!(card.description_or(EMPTY_DESCRIPTION), "Buy milk");
    }

    #[test]
    fn test_todo_form_omits_unset_fields() {
        let json = serde_json::to_value(FormRequest {
            form: TodoForm {
                description: "x".to_string(),
                ..Default::default()
            },
        })
        .unwrap();
        assert_eq!(json, json!({ "form": { "description": "x" } }));
    }
}
