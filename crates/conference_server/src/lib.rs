//! HTTP surface of the conference registry.
//!
//! # Responsibility
//! - Serve conference use-cases as a REST API.
//! - Own server configuration and HTTP error conventions.
//!
//! # Invariants
//! - No business rule lives here; handlers delegate to `conference_core`.

pub mod api;
pub mod config;
pub mod error;
pub mod headers;
mod server;
pub mod state;

pub use api::router;
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use server::{build_app, serve, ServerError};
pub use state::AppState;

/// Entity name used in alert headers and problem bodies.
pub const ENTITY_NAME: &str = "conference";
