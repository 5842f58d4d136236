//! # Taskboard API Server Library
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `bootstrap`: administrator seeding at startup
//! - `config`: configuration management
//! - `error`: error handling and HTTP response mapping
//! - `middleware`: response hardening layers
//! - `routes`: API route handlers

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
