/// Data models for the task board
///
/// Plain row types shared by the API server, the repository layer and the
/// client. None of these types talk to the database themselves; persistence
/// lives behind the traits in [`crate::repository`].
///
/// # Models
///
/// - `user`: accounts with active/blocked status and soft deletion
/// - `todo`: to-do items, their statuses and per-status grouping
/// - `role`: roles, permissions and the seeded names of both

pub mod role;
pub mod todo;
pub mod user;
