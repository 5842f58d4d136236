//! # Taskboard Client Library
//!
//! Consumes the Taskboard API on behalf of a UI.
//!
//! ## Modules
//!
//! - `api`: reqwest client for the REST endpoints
//! - `config`: client configuration
//! - `error`: client error type
//! - `events`: UI notification bus
//! - `identity`: in-memory mirror of the session
//! - `loader`: session cache over persistent storage
//! - `models`: wire models
//! - `routes`: named client routes
//! - `storage`: key-value storage backends
//! - `store`: reactive client state

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod loader;
pub mod models;
pub mod routes;
pub mod storage;
pub mod store;

pub use error::{ClientError, ClientResult};
