/// HTTP client for the Taskboard API
///
/// Stateless: authenticated calls take the access token explicitly, the
/// session itself lives in the [`UserStorageLoader`](crate::loader::UserStorageLoader).
///
/// # Example
///
/// ```no_run
/// use taskboard_client::{api::ApiClient, config::ClientConfig};
///
/// # async fn example() -> Result<(), taskboard_client::error::ClientError> {
/// let api = ApiClient::new(&ClientConfig::with_base_url("http://localhost:8080"))?;
/// let session = api.login("jane@example.com", "secret123").await?;
/// let groups = api.list_todos(&session.access_token).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::ClientConfig,
    error::{ClientError, ClientResult},
    models::{
        ErrorBody, FormRequest, ItemResponse, ItemsResponse, LoginRequest, LoginResponse, NewUser,
        RefreshRequest, RefreshResponse, SuccessResponse, TodoForm, TodoGroup, TodoItem, User,
        UserTodoes,
    },
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,

    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // Session

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = self.client.post(self.url("auth/login")).json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        send(request).await
    }

    /// Exchanges a refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> ClientResult<String> {
        let request = self.client.post(self.url("auth/refresh")).json(&RefreshRequest {
            refresh_token: refresh_token.to_string(),
        });
        let response: RefreshResponse = send(request).await?;
        Ok(response.access_token)
    }

    // To-do items

    pub async fn list_todos(&self, token: &str) -> ClientResult<Vec<TodoGroup>> {
        self.get_items(token, "todo/list").await
    }

    pub async fn create_todo(&self, token: &str, form: &TodoForm) -> ClientResult<TodoItem> {
        self.post_form(token, "todo/create", form).await
    }

    /// Partial update; fields missing from `form` are left alone
    pub async fn update_todo(
        &self,
        token: &str,
        id: i64,
        form: &serde_json::Value,
    ) -> ClientResult<TodoItem> {
        self.put_form(token, &format!("todo/update/{id}"), form).await
    }

    pub async fn set_todo_status(&self, token: &str, id: i64, status_id: i32) -> ClientResult<TodoItem> {
        let request = self
            .client
            .put(self.url(&format!("todo/status/{id}")))
            .bearer_auth(token)
            .json(&json!({ "statusId": status_id }));
        let response: ItemResponse<TodoItem> = send(request).await?;
        Ok(response.item)
    }

    /// Returns `false` when the item is not the caller's
    pub async fn delete_todo(&self, token: &str, id: i64) -> ClientResult<bool> {
        self.delete(token, &format!("todo/delete/{id}")).await
    }

    // Permissions

    pub async fn list_permissions(&self, token: &str) -> ClientResult<Vec<String>> {
        self.get_items(token, "user-permissions/list").await
    }

    // User administration

    pub async fn list_users(&self, token: &str) -> ClientResult<Vec<User>> {
        self.get_items(token, "admin/users/list").await
    }

    pub async fn create_user(&self, token: &str, user: &NewUser) -> ClientResult<User> {
        self.post_form(token, "admin/users/create", user).await
    }

    pub async fn delete_user(&self, token: &str, id: i64) -> ClientResult<bool> {
        self.delete(token, &format!("admin/users/delete/{id}")).await
    }

    pub async fn user_todoes(&self, token: &str, user_id: i64) -> ClientResult<Vec<TodoItem>> {
        let todoes: UserTodoes = self
            .get_items(token, &format!("admin/users/todoes/{user_id}"))
            .await?;
        Ok(todoes.items)
    }

    // Internal helpers

    async fn get_items<T: DeserializeOwned>(&self, token: &str, path: &str) -> ClientResult<T> {
        let request = self.client.get(self.url(path)).bearer_auth(token);
        let response: ItemsResponse<T> = send(request).await?;
        Ok(response.items)
    }

    async fn post_form<T: DeserializeOwned, F: Serialize>(
        &self,
        token: &str,
        path: &str,
        form: &F,
    ) -> ClientResult<T> {
        let request = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&FormRequest { form });
        let response: ItemResponse<T> = send(request).await?;
        Ok(response.item)
    }

    async fn put_form<T: DeserializeOwned, F: Serialize>(
        &self,
        token: &str,
        path: &str,
        form: &F,
    ) -> ClientResult<T> {
        let request = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&FormRequest { form });
        let response: ItemResponse<T> = send(request).await?;
        Ok(response.item)
    }

    async fn delete(&self, token: &str, path: &str) -> ClientResult<bool> {
        let request = self.client.delete(self.url(path)).bearer_auth(token);
        let response: SuccessResponse = send(request).await?;
        Ok(response.success)
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
    let response = request.send().await?;
    debug!(url = %response.url(), status = %response.status(), "API response");
    parse_response(response).await
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let bytes = response.bytes().await?;
    let (error, message) = match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => (body.error, body.message),
        Err(_) => (
            status.canonical_reason().unwrap_or("error").to_string(),
            String::from_utf8_lossy(&bytes).into_owned(),
        ),
    };
    warn!(status = status.as_u16(), %error, %message, "API request failed");

    Err(ClientError::Api {
        status: status.as_u16(),
        error,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let api = ApiClient::new(&ClientConfig::with_base_url("http://localhost:8080/")).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8080");
        assert_eq!(api.url("todo/list"), "http://localhost:8080/todo/list");
        assert_eq!(api.url("/todo/list"), "http://localhost:8080/todo/list");
    }
}
