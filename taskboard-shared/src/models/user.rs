/// User model
///
/// Users own to-do items and hold roles. Accounts are never physically
/// removed: deleting a user stamps `deleted_at` and default lookups skip
/// such rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password VARCHAR(255) NOT NULL,
///     status SMALLINT NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// Database access goes through [`crate::repository::UserRepository`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account status
///
/// Stored as `SMALLINT`: `1` is active, `0` is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// The user may not log in or act
    Blocked = 0,

    /// Regular account
    Active = 1,
}

impl Default for UserStatus {
    fn default() -> Self {
        UserStatus::Active
    }
}

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    ///
    /// Never leaves the server: skipped when serializing.
    #[serde(skip_serializing, default)]
    pub password: String,

    /// Active or blocked
    pub status: UserStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the account is active
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Whether the account is blocked
    pub fn is_blocked(&self) -> bool {
        !self.is_active()
    }

    /// Whether the account has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,

    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password: String,

    pub status: UserStatus,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written. `deleted_at` uses `Some(None)` to
/// restore a soft-deleted account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,

    pub email: Option<String>,

    /// New password hash
    pub password: Option<String>,

    pub status: Option<UserStatus>,

    pub deleted_at: Option<Option<DateTime<Utc>>>,
}

impl UpdateUser {
    /// Whether the update would write nothing besides `updated_at`
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.status.is_none()
            && self.deleted_at.is_none()
    }

    /// Soft-delete update stamping the given time
    pub fn soft_delete(at: DateTime<Utc>) -> Self {
        Self {
            deleted_at: Some(Some(at)),
            ..Default::default()
        }
    }

    /// Status-only update
    pub fn status(status: UserStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}
