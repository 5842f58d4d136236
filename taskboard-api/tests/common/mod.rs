//! Shared setup for the API integration tests
//!
//! Builds the real router on top of the in-memory repositories, so no
//! database is needed. Users are created straight through the
//! repositories and tokens are minted with the test secret.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use taskboard_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig},
};
use taskboard_shared::{
    auth::{
        jwt::{create_token, Claims, TokenType},
        password::hash_password,
    },
    models::{
        role::roles,
        user::{CreateUser, User, UserStatus},
    },
    repository::{memory::MemoryStore, Repositories, UserScope},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-that-is-at-least-32-characters-long";
pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        admin: None,
    }
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub repos: Repositories,
    pub app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::seeded());
        let repos = Repositories::from_store(store.clone());
        let app = build_router(AppState::new(repos.clone(), test_config()));

        Self { store, repos, app }
    }

    /// Creates an active user holding `role_names`
    pub async fn create_user(&self, role_names: &[&str]) -> User {
        let user = self
            .repos
            .users()
            .create(CreateUser {
                name: "Test User".to_string(),
                email: format!("test-{}@example.com", Uuid::new_v4()),
                password: hash_password(TEST_PASSWORD).unwrap(),
                status: UserStatus::Active,
            })
            .await
            .unwrap();

        let scope = UserScope::new(user.clone(), self.repos.clone());
        for role in role_names {
            scope.assign_role(role).await.unwrap();
        }

        user
    }

    pub async fn create_plain_user(&self) -> User {
        self.create_user(&[roles::USER]).await
    }

    pub async fn create_admin(&self) -> User {
        self.create_user(&[roles::ADMIN]).await
    }

    /// `Authorization` header value for the user
    pub fn auth_header(&self, user: &User) -> String {
        let token = create_token(&Claims::new(user.id, TokenType::Access), TEST_SECRET).unwrap();
        format!("Bearer {token}")
    }

    /// Sends a request through the router and decodes the JSON body
    ///
    /// A body that is not JSON comes back as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, self.auth_header(user));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    /// Posts `body` verbatim as `application/json`
    pub async fn post_raw(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str, user: Option<&User>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: Option<&User>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, user, Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: Option<&User>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, user, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: Option<&User>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, user, None).await
    }
}
