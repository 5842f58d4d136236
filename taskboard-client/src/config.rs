/// Client configuration
///
/// Read through the `config` crate: built-in defaults overridden by
/// `TASKBOARD_CLIENT_*` environment variables (a `.env` file is honored).
///
/// - `TASKBOARD_CLIENT_BASE_URL`: API root (default `http://127.0.0.1:8080`)
/// - `TASKBOARD_CLIENT_STORAGE_PATH`: JSON file backing the session
///   storage; in-memory storage when unset
/// - `TASKBOARD_CLIENT_TIMEOUT_SECS`: request timeout (default `30`)

use crate::error::ClientResult;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREFIX: &str = "TASKBOARD_CLIENT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,

    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            storage_path: None,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn load() -> ClientResult<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("timeout_secs", defaults.timeout_secs as i64)?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Client pointed at `base_url` with default settings
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reads_prefixed_environment() {
        std::env::set_var("TASKBOARD_CLIENT_TIMEOUT_SECS", "5");
        std::env::set_var("TASKBOARD_CLIENT_STORAGE_PATH", "/tmp/taskboard-session.json");

        let config = ClientConfig::load().unwrap();

        std::env::remove_var("TASKBOARD_CLIENT_TIMEOUT_SECS");
        std::env::remove_var("TASKBOARD_CLIENT_STORAGE_PATH");

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(
            config.storage_path,
            Some(PathBuf::from("/tmp/taskboard-session.json"))
        );
    }

    #[test]
    fn test_with_base_url() {
        let config = ClientConfig::with_base_url("http://localhost:3000");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.storage_path.is_none());
    }
}
