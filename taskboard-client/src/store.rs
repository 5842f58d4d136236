/// Reactive client state
///
/// State `{token, userId, groups, permissions}` lives in a
/// `tokio::sync::watch` channel: mutations replace it and every
/// [`Store::subscribe`]r sees the latest value. Actions are the public
/// entry points; they commit mutations and talk to the loader.
///
/// # Example
///
/// ```no_run
/// use taskboard_client::{
///     api::ApiClient, config::ClientConfig, events::EventBus, loader::UserStorageLoader,
///     storage::MemoryStorage, store::Store,
/// };
///
/// # async fn example() -> Result<(), taskboard_client::error::ClientError> {
/// let api = ApiClient::new(&ClientConfig::load()?)?;
/// let mut loader = UserStorageLoader::new(MemoryStorage::new(), api);
/// let store = Store::new(EventBus::new());
///
/// let user = loader.login("jane@example.com", "secret123").await?;
/// store.set_user_data(&user);
/// store.update_groups_list(&mut loader).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    error::ClientResult,
    events::EventBus,
    identity::UserData,
    loader::UserStorageLoader,
    models::TodoGroup,
    storage::KeyValueStorage,
};
use tokio::sync::watch;
use tracing::warn;

pub const CAN_MANAGE_USERS: &str = "canManageUsers";
pub const CAN_MANAGE_USERS_TODOES: &str = "canManageUsersTodoes";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub token: Option<String>,

    pub user_id: Option<String>,

    pub groups: Vec<TodoGroup>,

    pub permissions: Vec<String>,
}

pub struct Store {
    state: watch::Sender<StoreState>,

    bus: EventBus,
}

impl Store {
    pub fn new(bus: EventBus) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self { state, bus }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Snapshot of the current state
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    // Getters

    pub fn get_token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn not_logged(&self) -> bool {
        let state = self.state.borrow();
        state.token.is_none() || state.user_id.is_none()
    }

    pub fn is_logged(&self) -> bool {
        !self.not_logged()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.state
            .borrow()
            .permissions
            .iter()
            .any(|p| p == permission)
    }

    pub fn can_manage_users(&self) -> bool {
        self.has_permission(CAN_MANAGE_USERS)
    }

    pub fn can_manage_users_todoes(&self) -> bool {
        self.has_permission(CAN_MANAGE_USERS_TODOES)
    }

    // Mutations

    pub fn set_user_state(&self, user: &UserData) {
        self.state.send_modify(|state| {
            state.token = user.token.clone();
            state.user_id = user.user_id.clone();
        });
    }

    pub fn set_user_groups(&self, groups: Vec<TodoGroup>) {
        self.state.send_modify(|state| state.groups = groups);
    }

    pub fn set_user_permissions(&self, permissions: Vec<String>) {
        self.state.send_modify(|state| state.permissions = permissions);
    }

    // Actions

    pub fn set_user_data(&self, user: &UserData) {
        self.set_user_state(user);
    }

    pub fn set_permissions(&self, permissions: Vec<String>) {
        self.set_user_permissions(permissions);
    }

    pub fn set_groups(&self, groups: Vec<TodoGroup>) {
        self.set_user_groups(groups);
    }

    /// Reloads the to-do list through the loader and publishes its groups
    ///
    /// A failure is logged and reported on the event bus before being
    /// returned; the published groups are left as they were.
    pub async fn update_groups_list<S: KeyValueStorage>(
        &self,
        loader: &mut UserStorageLoader<S>,
    ) -> ClientResult<()> {
        if let Err(e) = loader.load_todo_items().await {
            warn!(error = %e, "Failed to load todo list");
            self.bus.show_error(None, &e.to_string(), Vec::new());
            return Err(e);
        }

        self.set_groups(loader.get_groups().to_vec());
        Ok(())
    }

    /// Reloads the permission names through the loader and publishes them
    pub async fn update_permissions<S: KeyValueStorage>(
        &self,
        loader: &mut UserStorageLoader<S>,
    ) -> ClientResult<()> {
        match loader.load_permissions().await {
            Ok(permissions) => {
                self.set_permissions(permissions);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load permissions");
                self.bus.show_error(None, &e.to_string(), Vec::new());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::ApiClient, config::ClientConfig, error::ClientError, events::UiEvent,
        storage::MemoryStorage,
    };

    fn logged_in() -> UserData {
        UserData {
            token: Some("t".to_string()),
            user_id: Some("7".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_login_state_getters() {
        let store = Store::new(EventBus::new());
        assert!(store.not_logged());
        assert!(store.get_token().is_none());

        store.set_user_data(&UserData {
            token: Some("t".to_string()),
            ..Default::default()
        });
        assert!(store.not_logged());

        store.set_user_data(&logged_in());
        assert!(store.is_logged());
        assert_eq!(store.get_token().as_deref(), Some("t"));

        store.set_user_data(&UserData::default());
        assert!(store.not_logged());
    }

    #[test]
    fn test_permission_getters() {
        let store = Store::new(EventBus::new());
        assert!(!store.can_manage_users());

        store.set_permissions(vec![CAN_MANAGE_USERS.to_string()]);
        assert!(store.can_manage_users());
        assert!(!store.can_manage_users_todoes());
        assert!(store.has_permission("canManageUsers"));
        assert!(!store.has_permission("somethingElse"));
    }

    #[tokio::test]
    async fn test_subscribers_observe_mutations() {
        let store = Store::new(EventBus::new());
        let mut rx = store.subscribe();

        store.set_user_data(&logged_in());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().user_id.as_deref(), Some("7"));

        store.set_permissions(vec!["p".to_string()]);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().permissions, vec!["p".to_string()]);
        assert_eq!(store.state().token.as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn test_failed_update_is_reported_and_returned() {
        let store = Store::new(EventBus::new());
        let mut events = store.bus().subscribe();
        let api = ApiClient::new(&ClientConfig::with_base_url("http://127.0.0.1:9")).unwrap();
        let mut loader = UserStorageLoader::new(MemoryStorage::new(), api);

        let result = store.update_groups_list(&mut loader).await;
        assert!(matches!(result, Err(ClientError::NotLoggedIn)));

        match events.recv().await.unwrap() {
            UiEvent::Error { heading, message, .. } => {
                assert_eq!(heading, "Error");
                assert_eq!(message, "Not logged in");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(store.state().groups.is_empty());
    }
}
