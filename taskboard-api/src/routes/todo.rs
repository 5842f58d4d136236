/// To-do items of the acting user
///
/// Mounted at `/todo`. Every hook works through the acting user's scope,
/// so other users' items behave as if they did not exist: updating one is
/// a 404 and deleting one reports `{"success": false}`.
///
/// Besides the CRUD routes:
///
/// ```text
/// PUT /todo/status/:id   {"statusId": 3}   -> {"item": {...}}
/// ```

use super::crud::{parse_id, CrudController, CrudRequest, ItemResponse};
use crate::{app::AppState, error::ApiResult};
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::put,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::middleware::CurrentUser,
    models::todo::{TodoItem, TodoItemForm, TodoStatusGroup, UpdateTodoItem},
};
use tracing::info;
use validator::Validate;

pub struct TodoController;

#[async_trait]
impl CrudController for TodoController {
    const MOUNT_PATH: &'static str = "/todo";

    type Listed = TodoStatusGroup;
    type Item = TodoItem;

    /// The acting user's items grouped by status
    async fn list(&self, req: CrudRequest) -> ApiResult<Vec<TodoStatusGroup>> {
        let scope = req.define_user_repo()?;
        Ok(scope.get_todos_by_status_groups().await?)
    }

    async fn create(&self, req: CrudRequest) -> ApiResult<TodoItem> {
        let scope = req.define_user_repo()?;
        let form: TodoItemForm = req.form()?;
        form.validate()?;

        let item = scope.add_todo_item(form).await?;
        info!(user_id = scope.user_id(), todo_id = item.id, "Todo item created");

        Ok(item)
    }

    async fn update(&self, id: i64, req: CrudRequest) -> ApiResult<TodoItem> {
        let scope = req.define_user_repo()?;
        let attrs: UpdateTodoItem = req.form()?;
        attrs.validate()?;

        Ok(scope.update_todo_item(id, &attrs).await?)
    }

    async fn delete(&self, id: i64, req: CrudRequest) -> ApiResult<bool> {
        let scope = req.define_user_repo()?;
        let deleted = scope.delete_todo_item(id).await?;
        if deleted {
            info!(user_id = scope.user_id(), todo_id = id, "Todo item deleted");
        }

        Ok(deleted)
    }

    fn custom_routes() -> Router<AppState> {
        Router::new().route("/status/:id", put(set_status))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status_id: i32,
}

/// Moves an item to another status
async fn set_status(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    user: Option<Extension<CurrentUser>>,
    body: Result<Json<SetStatusRequest>, JsonRejection>,
) -> ApiResult<Json<ItemResponse<TodoItem>>> {
    let id = parse_id(&raw_id)?;
    let Json(body) = body?;

    let req = CrudRequest::new(user.map(|Extension(u)| u), state.repos.clone(), None);
    let scope = req.define_user_repo()?;
    let item = scope.set_todo_status(id, body.status_id).await?;

    Ok(Json(ItemResponse { item }))
}
