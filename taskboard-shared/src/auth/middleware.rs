/// Bearer-token authentication middleware
///
/// Validates the access token from `Authorization: Bearer <token>`, looks
/// up its subject among non-deleted users and stores the result as a
/// [`CurrentUser`] request extension:
///
/// - missing, malformed or invalid token: 401
/// - blocked user: 403
/// - unknown or soft-deleted user: the request continues without a
///   `CurrentUser`, leaving the decision to the handler
///
/// The API server wires [`jwt_auth_middleware`] with
/// `axum::middleware::from_fn_with_state`.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error, warn};

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::User;
use crate::repository::{RepositoryError, Repositories};

/// The authenticated, non-deleted user of the request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("User is blocked")]
    Blocked,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AuthError::MissingCredentials
            | AuthError::InvalidFormat(_)
            | AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AuthError::Blocked => (StatusCode::FORBIDDEN, "forbidden"),
            AuthError::Repository(e) => {
                error!(error = %e, "User lookup failed during authentication");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "internal_error",
                        "message": "An internal error occurred",
                    })),
                )
                    .into_response();
            }
        };

        (
            status,
            Json(json!({ "error": error, "message": self.to_string() })),
        )
            .into_response()
    }
}

/// Extracts the token from a `Bearer` authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Resolves the user behind the request's access token
///
/// Returns `Ok(None)` when the token is valid but its subject is missing
/// or soft-deleted.
pub async fn authenticate(
    headers: &HeaderMap,
    secret: &str,
    repos: &Repositories,
) -> Result<Option<CurrentUser>, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        other => AuthError::InvalidToken(other.to_string()),
    })?;
    let user_id = claims
        .user_id()
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    let Some(user) = repos.users().find_by_id(user_id, false).await? else {
        debug!(user_id, "Token subject does not resolve to an existing user");
        return Ok(None);
    };

    if user.is_blocked() {
        warn!(user_id, "Blocked user attempted a request");
        return Err(AuthError::Blocked);
    }

    Ok(Some(CurrentUser(user)))
}

/// Authenticates the request and attaches [`CurrentUser`] when resolved
pub async fn jwt_auth_middleware(
    secret: &str,
    repos: &Repositories,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Some(current) = authenticate(req.headers(), secret, repos).await? {
        req.extensions_mut().insert(current);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};
    use crate::models::user::{CreateUser, UserStatus};
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    async fn user(repos: &Repositories, status: UserStatus) -> User {
        repos
            .users()
            .create(CreateUser {
                name: "Test".to_string(),
                email: format!("{status:?}@example.com"),
                password: "hash".to_string(),
                status,
            })
            .await
            .unwrap()
    }

    fn access_token(user_id: i64) -> String {
        create_token(&Claims::new(user_id, TokenType::Access), SECRET).unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("abc")).unwrap(), "abc");

        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert!(matches!(
            bearer_token(&basic),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_active_user_is_attached() {
        let repos = Repositories::in_memory();
        let active = user(&repos, UserStatus::Active).await;

        let current = authenticate(&headers_with(&access_token(active.id)), SECRET, &repos)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.0.id, active.id);
    }

    #[tokio::test]
    async fn test_blocked_user_is_rejected() {
        let repos = Repositories::in_memory();
        let blocked = user(&repos, UserStatus::Blocked).await;

        let err = authenticate(&headers_with(&access_token(blocked.id)), SECRET, &repos)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Blocked));
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_deleted_or_unknown_user_is_not_attached() {
        let repos = Repositories::in_memory();
        let deleted = user(&repos, UserStatus::Active).await;
        repos.users().delete(deleted.id).await.unwrap();

        let resolved = authenticate(&headers_with(&access_token(deleted.id)), SECRET, &repos)
            .await
            .unwrap();
        assert!(resolved.is_none());

        let resolved = authenticate(&headers_with(&access_token(999)), SECRET, &repos)
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let repos = Repositories::in_memory();
        let refresh = create_token(&Claims::new(1, TokenType::Refresh), SECRET).unwrap();

        let err = authenticate(&headers_with(&refresh), SECRET, &repos)
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
