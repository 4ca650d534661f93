//! Standalone host for the simple tax configuration endpoints.
//!
//! This library exposes the router and server loop for the
//! `simpletax-server` binary and for integration tests.

pub mod api;
pub mod config;
pub mod server;

pub use api::{create_router, AppState};
pub use config::{ConfigError, TenantsFile};
pub use server::{serve, ServerConfig};
