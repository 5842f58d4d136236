/// Generic CRUD dispatch
///
/// A resource implements [`CrudController`] and is mounted with
/// [`crud_router`], which registers
///
/// ```text
/// GET    {mount}/list         -> list       -> {"items": [...]}
/// POST   {mount}/create       -> create     -> {"item": {...}}
/// PUT    {mount}/update/:id   -> update     -> {"item": {...}}
/// DELETE {mount}/delete/:id   -> delete     -> {"success": bool}
/// ```
///
/// plus whatever [`CrudController::custom_routes`] returns. Hooks a
/// resource does not override answer 405. The controller value is shared
/// through an `Extension<Arc<C>>`; the acting user and any repository
/// scope are resolved per call.
///
/// Create and update bodies carry the payload under `form`:
///
/// ```json
/// { "form": { "description": "Buy milk" } }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use taskboard_shared::{
    auth::{authorization, middleware::CurrentUser},
    repository::{Repositories, UserScope},
};
use tracing::debug;

/// `{"items": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse<T> {
    pub items: T,
}

/// `{"item": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    pub item: T,
}

/// `{"success": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Everything a hook gets to see about the request
pub struct CrudRequest {
    /// Set by the authentication middleware when the token resolved to an
    /// existing user
    pub user: Option<CurrentUser>,

    pub repos: Repositories,

    pub body: Option<Value>,
}

impl CrudRequest {
    pub fn new(user: Option<CurrentUser>, repos: Repositories, body: Option<Value>) -> Self {
        Self { user, repos, body }
    }

    /// Repository scope of the acting user
    ///
    /// # Errors
    ///
    /// 400 `User is not defined` when the request has no resolved user.
    pub fn define_user_repo(&self) -> ApiResult<UserScope> {
        Ok(authorization::define_user_repo(
            self.user.as_ref(),
            &self.repos,
        )?)
    }

    /// Deserializes the `form` member of the body
    pub fn form<T: DeserializeOwned>(&self) -> ApiResult<T> {
        let form = self
            .body
            .as_ref()
            .and_then(|body| body.get("form"))
            .ok_or_else(|| ApiError::BadRequest("Missing form".to_string()))?;

        serde_json::from_value(form.clone())
            .map_err(|e| ApiError::BadRequest(format!("Invalid form: {e}")))
    }
}

fn not_allowed(action: &str) -> ApiError {
    ApiError::MethodNotAllowed(format!("{action} is not supported for this resource"))
}

/// A resource served through the generic CRUD routes
#[async_trait]
pub trait CrudController: Send + Sync + 'static {
    /// Path prefix, e.g. `/todo`
    const MOUNT_PATH: &'static str;

    /// Element type of the list response
    type Listed: Serialize + Send;

    /// Type returned by create and update
    type Item: Serialize + Send;

    async fn list(&self, req: CrudRequest) -> ApiResult<Vec<Self::Listed>>;

    async fn create(&self, _req: CrudRequest) -> ApiResult<Self::Item> {
        Err(not_allowed("create"))
    }

    async fn update(&self, _id: i64, _req: CrudRequest) -> ApiResult<Self::Item> {
        Err(not_allowed("update"))
    }

    async fn delete(&self, _id: i64, _req: CrudRequest) -> ApiResult<bool> {
        Err(not_allowed("delete"))
    }

    /// Extra routes merged next to the default ones
    ///
    /// Handlers can extract `Extension<Arc<Self>>`.
    fn custom_routes() -> Router<AppState> {
        Router::new()
    }
}

/// Builds the route table of a controller under its mount path
pub fn crud_router<C: CrudController>(controller: C) -> Router<AppState> {
    let routes = Router::new()
        .route("/list", get(action_list::<C>))
        .route("/create", post(action_create::<C>))
        .route("/update/:id", put(action_update::<C>))
        .route("/delete/:id", delete(action_delete::<C>))
        .merge(C::custom_routes())
        .layer(Extension(Arc::new(controller)));

    Router::new().nest(C::MOUNT_PATH, routes)
}

/// Parses a path id, rejecting anything that is not a 64-bit integer
pub fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid id: {raw}")))
}

fn current_user(user: Option<Extension<CurrentUser>>) -> Option<CurrentUser> {
    user.map(|Extension(user)| user)
}

async fn action_list<C: CrudController>(
    State(state): State<AppState>,
    Extension(controller): Extension<Arc<C>>,
    user: Option<Extension<CurrentUser>>,
) -> ApiResult<Json<ItemsResponse<Vec<C::Listed>>>> {
    let req = CrudRequest::new(current_user(user), state.repos.clone(), None);
    let items = controller.list(req).await?;

    Ok(Json(ItemsResponse { items }))
}

async fn action_create<C: CrudController>(
    State(state): State<AppState>,
    Extension(controller): Extension<Arc<C>>,
    user: Option<Extension<CurrentUser>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ItemResponse<C::Item>>> {
    let Json(body) = body?;
    let req = CrudRequest::new(current_user(user), state.repos.clone(), Some(body));
    let item = controller.create(req).await?;

    Ok(Json(ItemResponse { item }))
}

async fn action_update<C: CrudController>(
    State(state): State<AppState>,
    Extension(controller): Extension<Arc<C>>,
    Path(raw_id): Path<String>,
    user: Option<Extension<CurrentUser>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ItemResponse<C::Item>>> {
    let id = parse_id(&raw_id)?;
    let Json(body) = body?;
    debug!(resource = C::MOUNT_PATH, id, "Update requested");

    let req = CrudRequest::new(current_user(user), state.repos.clone(), Some(body));
    let item = controller.update(id, req).await?;

    Ok(Json(ItemResponse { item }))
}

async fn action_delete<C: CrudController>(
    State(state): State<AppState>,
    Extension(controller): Extension<Arc<C>>,
    Path(raw_id): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_id(&raw_id)?;
    debug!(resource = C::MOUNT_PATH, id, "Delete requested");

    let req = CrudRequest::new(current_user(user), state.repos.clone(), None);
    let success = controller.delete(id, req).await?;

    Ok(Json(SuccessResponse { success }))
}
