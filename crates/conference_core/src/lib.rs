//! Core domain logic for the conference registry.
//! This crate is the single source of truth for conference invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::conference::{Conference, ConferenceId, ConferenceValidationError};
pub use model::shape::{check_conference_shape, conforms, FieldKind, ShapeError, ShapeViolation};
pub use repo::conference_repo::{
    ConferenceListQuery, ConferenceRepository, ConferenceSort, InvalidSort, RepoError, RepoResult,
    SortDirection, SortField, SqliteConferenceRepository,
};
pub use search::fts::{search_conferences, SearchError, SearchHit, SearchQuery, SearchResult};
pub use service::conference_service::{
    ConferencePage, ConferenceService, ConferenceServiceError, ServiceResult,
};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
