/// Session cache in front of the persistent storage
///
/// The loader owns the storage backend, the [`UserIdentity`] mirror and
/// the API client. Construction hydrates the identity keys from storage;
/// writes through [`UserStorageLoader::fill_storage`] mark the mirror
/// stale so the next read hydrates again.
///
/// Every mutating or loading call takes `&mut self`, so one loader never
/// runs two fetches at once.

use crate::{
    api::ApiClient,
    error::{ClientError, ClientResult},
    identity::{UserData, UserIdentity, REFRESH_TOKEN, TOKEN, USER_EMAIL, USER_ID, USER_NAME},
    models::{TodoGroup, TodoItem},
    storage::KeyValueStorage,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

pub struct UserStorageLoader<S: KeyValueStorage> {
    storage: S,

    identity: UserIdentity,

    was_loaded: bool,

    api: ApiClient,
}

impl<S: KeyValueStorage> UserStorageLoader<S> {
    pub fn new(storage: S, api: ApiClient) -> Self {
        let mut loader = Self {
            storage,
            identity: UserIdentity::new(),
            was_loaded: false,
            api,
        };
        loader.fill_from_storage();
        loader
    }

    fn fill_from_storage(&mut self) {
        for key in self.identity.keys() {
            let value = self.storage.get_item(key);
            self.identity.set(key, value);
        }
        self.was_loaded = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.was_loaded
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Writes every pair to storage
    ///
    /// Strings are stored as-is, `null` removes the key, anything else is
    /// stored as its JSON text (so `1` becomes `"1"`). The mirror goes stale
    /// before the first write, so pairs written ahead of a failing one are
    /// still seen by the next read.
    pub fn fill_storage(&mut self, data: &Map<String, Value>) -> ClientResult<()> {
        self.was_loaded = false;

        for (key, value) in data {
            match value {
                Value::Null => self.storage.remove_item(key)?,
                Value::String(s) => self.storage.set_item(key, s.clone())?,
                other => self.storage.set_item(key, other.to_string())?,
            }
        }

        Ok(())
    }

    /// Identity values, hydrated again first when storage was written
    pub fn get_user_data(&mut self) -> UserData {
        if !self.was_loaded {
            self.fill_from_storage();
        }

        self.identity.params().clone()
    }

    /// Clears storage and every cached value
    pub fn flush_data(&mut self) -> ClientResult<()> {
        self.storage.clear()?;
        self.identity.clear_collections();
        self.fill_from_storage();

        debug!("Session data flushed");
        Ok(())
    }

    /// The stored access token
    pub fn token(&mut self) -> ClientResult<String> {
        self.get_user_data().token.ok_or(ClientError::NotLoggedIn)
    }

    /// Logs in and persists the session
    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<UserData> {
        let session = self.api.login(email, password).await?;

        let mut data = Map::new();
        data.insert(TOKEN.to_string(), Value::String(session.access_token));
        data.insert(REFRESH_TOKEN.to_string(), Value::String(session.refresh_token));
        data.insert(USER_ID.to_string(), Value::from(session.user_id));
        data.insert(USER_NAME.to_string(), Value::String(session.name));
        data.insert(USER_EMAIL.to_string(), Value::String(session.email));
        self.fill_storage(&data)?;

        info!(user_id = session.user_id, "Session stored");
        Ok(self.get_user_data())
    }

    /// Replaces the stored access token using the refresh token
    pub async fn refresh_session(&mut self) -> ClientResult<String> {
        let refresh_token = self
            .get_user_data()
            .refresh_token
            .ok_or(ClientError::NotLoggedIn)?;

        let token = self.api.refresh(&refresh_token).await?;
        self.was_loaded = false;
        self.storage.set_item(TOKEN, token.clone())?;

        Ok(token)
    }

    /// Fetches the user's to-do list and caches groups and cards
    pub async fn load_todo_items(&mut self) -> ClientResult<()> {
        let token = self.token()?;
        let groups = self.api.list_todos(&token).await?;

        debug!(groups = groups.len(), "Todo list loaded");
        self.identity.set_groups(groups);
        Ok(())
    }

    /// Fetches and caches the user's permission names
    pub async fn load_permissions(&mut self) -> ClientResult<Vec<String>> {
        let token = self.token()?;
        let permissions = self.api.list_permissions(&token).await?;

        self.identity.set_permissions(permissions);
        Ok(self.identity.permissions().to_vec())
    }

    /// Cards of the last loaded list, flattened across groups
    pub fn get_todo_items(&self) -> &[TodoItem] {
        self.identity.cards()
    }

    pub fn get_groups(&self) -> &[TodoGroup] {
        self.identity.groups()
    }

    pub fn get_permissions(&self) -> &[String] {
        self.identity.permissions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ClientConfig, storage::MemoryStorage};
    use serde_json::json;

    fn api() -> ApiClient {
        ApiClient::new(&ClientConfig::with_base_url("http://127.0.0.1:9")).unwrap()
    }

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_construction_hydrates_from_storage() {
        let mut storage = MemoryStorage::new();
        storage.set_item("token", "abc".to_string()).unwrap();
        storage.set_item("unrelated", "x".to_string()).unwrap();

        let mut loader = UserStorageLoader::new(storage, api());
        assert!(loader.is_loaded());

        let data = loader.get_user_data();
        assert_eq!(data.token.as_deref(), Some("abc"));
        assert!(data.user_id.is_none());
    }

    #[test]
    fn test_fill_storage_then_get_user_data() {
        let mut loader = UserStorageLoader::new(MemoryStorage::new(), api());

        loader.fill_storage(&map(json!({ "token": 1 }))).unwrap();
        assert!(!loader.is_loaded());

        assert_eq!(loader.get_user_data().token.as_deref(), Some("1"));
        assert!(loader.is_loaded());

        loader
            .fill_storage(&map(json!({ "userName": "Jane", "token": null })))
            .unwrap();
        let data = loader.get_user_data();
        assert_eq!(data.user_name.as_deref(), Some("Jane"));
        assert!(data.token.is_none());
    }

    /// Memory storage that rejects the write with the given 1-based index
    struct FailingStorage {
        inner: MemoryStorage,
        writes: usize,
        fail_on: usize,
    }

    impl FailingStorage {
        fn failing_on(fail_on: usize) -> Self {
            Self {
                inner: MemoryStorage::new(),
                writes: 0,
                fail_on,
            }
        }

        fn write(&mut self) -> ClientResult<()> {
            self.writes += 1;
            if self.writes == self.fail_on {
                return Err(ClientError::Storage(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            Ok(())
        }
    }

    impl KeyValueStorage for FailingStorage {
        fn get_item(&self, key: &str) -> Option<String> {
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: String) -> ClientResult<()> {
            self.write()?;
            self.inner.set_item(key, value)
        }

        fn remove_item(&mut self, key: &str) -> ClientResult<()> {
            self.write()?;
            self.inner.remove_item(key)
        }

        fn clear(&mut self) -> ClientResult<()> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_partial_fill_is_visible_after_failure() {
        let mut loader = UserStorageLoader::new(FailingStorage::failing_on(2), api());

        let result = loader.fill_storage(&map(json!({ "refreshToken": "r", "token": "t" })));
        assert!(matches!(result, Err(ClientError::Storage(_))));

        let data = loader.get_user_data();
        assert_eq!(
            data.refresh_token,
            loader.storage().get_item("refreshToken")
        );
        assert_eq!(data.refresh_token.as_deref(), Some("r"));
        assert!(data.token.is_none());
    }

    #[test]
    fn test_flush_data_empties_everything() {
        let mut loader = UserStorageLoader::new(MemoryStorage::new(), api());
        loader
            .fill_storage(&map(json!({ "token": "t", "userId": 7, "refreshToken": "r" })))
            .unwrap();
        loader.identity.set_permissions(vec!["canManageUsers".to_string()]);

        loader.flush_data().unwrap();

        assert!(loader.get_user_data().is_empty());
        assert!(loader.get_permissions().is_empty());
        assert!(loader.storage().is_empty());
    }

    #[test]
    fn test_flush_data_on_empty_storage() {
        let mut loader = UserStorageLoader::new(MemoryStorage::new(), api());
        loader.flush_data().unwrap();
        assert!(loader.get_user_data().is_empty());
    }

    #[tokio::test]
    async fn test_loading_without_token_fails_before_any_request() {
        let mut loader = UserStorageLoader::new(MemoryStorage::new(), api());

        assert!(matches!(
            loader.load_todo_items().await,
            Err(ClientError::NotLoggedIn)
        ));
        assert!(matches!(
            loader.load_permissions().await,
            Err(ClientError::NotLoggedIn)
        ));
        assert!(matches!(
            loader.refresh_session().await,
            Err(ClientError::NotLoggedIn)
        ));
    }
}
