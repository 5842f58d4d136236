/// Permission names of the acting user
///
/// Mounted at `/user-permissions`; only `list` is served, the other CRUD
/// hooks answer 405. A user without roles gets an empty list.

use super::crud::{CrudController, CrudRequest};
use crate::error::ApiResult;
use async_trait::async_trait;

pub struct UserPermissionsController;

#[async_trait]
impl CrudController for UserPermissionsController {
    const MOUNT_PATH: &'static str = "/user-permissions";

    type Listed = String;
    type Item = String;

    async fn list(&self, req: CrudRequest) -> ApiResult<Vec<String>> {
        let scope = req.define_user_repo()?;
        Ok(scope.get_permission_names().await?)
    }
}
