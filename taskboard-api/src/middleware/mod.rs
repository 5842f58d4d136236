/// Server-specific tower middleware
///
/// Authentication lives in `taskboard_shared::auth::middleware`; this
/// module only holds layers that have no meaning outside the HTTP server.

pub mod security;
