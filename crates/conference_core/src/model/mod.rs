//! Conference domain model.
//!
//! # Responsibility
//! - Define the canonical conference record used by every layer.
//! - Provide structural conformance checks for untyped JSON input.
//!
//! # Invariants
//! - Conferences are identified by a storage-assigned integer id.
//! - Shape checks never mutate or coerce input values.

pub mod conference;
pub mod shape;
