/// Authentication endpoints
///
/// - `POST /auth/login` - exchange credentials for tokens
/// - `POST /auth/refresh` - exchange a refresh token for an access token
///
/// Accounts are created by administrators; there is no self-registration.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, password},
    models::user::User,
};
use tracing::{info, warn};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: i64,

    pub name: String,

    pub email: String,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

fn blocked() -> ApiError {
    ApiError::Forbidden("User is blocked".to_string())
}

/// Login endpoint
///
/// ```text
/// POST /auth/login
/// {"email": "user@example.com", "password": "secret123"}
/// ```
///
/// # Errors
///
/// - `400`: body is not valid JSON
/// - `422`: malformed email or empty password
/// - `401`: unknown email, deleted account or wrong password
/// - `403`: the account is blocked
pub async fn login(
    State(state): State<AppState>,
    req: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = req?;
    req.validate()?;

    let user = state
        .repos
        .users()
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !password::verify_password(&req.password, &user.password)? {
        warn!(user_id = user.id, "Login with wrong password");
        return Err(invalid_credentials());
    }

    if user.is_blocked() {
        return Err(blocked());
    }

    let access_claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
        access_token,
        refresh_token,
    }))
}

/// Token refresh endpoint
///
/// ```text
/// POST /auth/refresh
/// {"refreshToken": "eyJ..."}
/// ```
///
/// # Errors
///
/// - `401`: invalid or expired token, an access token presented as a
///   refresh token, or a subject that no longer exists
/// - `403`: the account is blocked
pub async fn refresh(
    State(state): State<AppState>,
    req: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<RefreshResponse>> {
    let Json(req) = req?;
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;
    let user = refreshable_user(&state, claims.user_id()?).await?;

    let access_token = jwt::create_token(
        &jwt::Claims::new(user.id, jwt::TokenType::Access),
        state.jwt_secret(),
    )?;

    Ok(Json(RefreshResponse { access_token }))
}

/// The token subject, if it still exists and may sign in
async fn refreshable_user(state: &AppState, user_id: i64) -> ApiResult<User> {
    let user = state
        .repos
        .users()
        .find_by_id(user_id, false)
        .await?
        .ok_or_else(|| {
            warn!(user_id, "Refresh for a missing user");
            ApiError::Unauthorized("User not found".to_string())
        })?;

    if user.is_blocked() {
        return Err(blocked());
    }

    Ok(user)
}
