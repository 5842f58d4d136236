/// In-memory mirror of the session
///
/// Holds the persisted identity keys plus the collections fetched from
/// the API, so reads do not go back to storage.

use crate::models::{TodoGroup, TodoItem};
use serde::{Deserialize, Serialize};

pub const TOKEN: &str = "token";
pub const REFRESH_TOKEN: &str = "refreshToken";
pub const USER_ID: &str = "userId";
pub const USER_NAME: &str = "userName";
pub const USER_EMAIL: &str = "userEmail";

/// Keys hydrated from storage
pub const IDENTITY_KEYS: [&str; 5] = [TOKEN, REFRESH_TOKEN, USER_ID, USER_NAME, USER_EMAIL];

/// Values of the identity keys; `None` when absent from storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub token: Option<String>,

    pub refresh_token: Option<String>,

    pub user_id: Option<String>,

    pub user_name: Option<String>,

    pub user_email: Option<String>,
}

impl UserData {
    /// Whether every identity value is absent
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            TOKEN => Some(&mut self.token),
            REFRESH_TOKEN => Some(&mut self.refresh_token),
            USER_ID => Some(&mut self.user_id),
            USER_NAME => Some(&mut self.user_name),
            USER_EMAIL => Some(&mut self.user_email),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserIdentity {
    params: UserData,

    cards: Vec<TodoItem>,

    groups: Vec<TodoGroup>,

    permissions: Vec<String>,
}

impl UserIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &'static [&'static str] {
        &IDENTITY_KEYS
    }

    /// Sets an identity value, returning `false` for an unknown key
    pub fn set(&mut self, key: &str, value: Option<String>) -> bool {
        match self.params.slot(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn params(&self) -> &UserData {
        &self.params
    }

    pub fn cards(&self) -> &[TodoItem] {
        &self.cards
    }

    pub fn groups(&self) -> &[TodoGroup] {
        &self.groups
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Replaces the groups and the flattened card list together
    pub fn set_groups(&mut self, groups: Vec<TodoGroup>) {
        self.cards = TodoGroup::cards(&groups);
        self.groups = groups;
    }

    pub fn set_permissions(&mut self, permissions: Vec<String>) {
        self.permissions = permissions;
    }

    /// Drops the fetched collections
    pub fn clear_collections(&mut self) {
        self.cards.clear();
        self.groups.clear();
        self.permissions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_known_and_unknown_keys() {
        let mut identity = UserIdentity::new();

        assert!(identity.set(TOKEN, Some("abc".to_string())));
        assert!(identity.set(USER_ID, Some("7".to_string())));
        assert!(!identity.set("cards", Some("[]".to_string())));

        assert_eq!(identity.params().token.as_deref(), Some("abc"));
        assert_eq!(identity.params().user_id.as_deref(), Some("7"));
        assert!(!identity.params().is_empty());

        identity.set(TOKEN, None);
        identity.set(USER_ID, None);
        assert!(identity.params().is_empty());
    }

    #[test]
    fn test_user_data_serializes_with_storage_keys() {
        let data = UserData {
            refresh_token: Some("r".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["refreshToken"], "r");
        assert!(json["userEmail"].is_null());
    }
}
