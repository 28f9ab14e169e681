//! Full-text search entry points.
//!
//! # Responsibility
//! - Expose conference query APIs backed by the SQLite FTS5 index.
//! - Keep query-string parsing and result shaping inside core.

pub mod fts;
