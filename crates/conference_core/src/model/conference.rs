//! Conference domain model.
//!
//! # Responsibility
//! - Define the canonical conference record shared by storage, search and API.
//! - Encode the identity rules for create/update requests.
//!
//! # Invariants
//! - `id` is assigned by storage; a record that was never persisted has no id.
//! - `date` is opaque text and is never parsed as a calendar value.
//! - A patch never changes `id`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned conference identifier.
pub type ConferenceId = i64;

/// Canonical conference record.
///
/// Every field is optional; absent and `null` are equivalent on input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    #[serde(default)]
    pub id: Option<ConferenceId>,
    #[serde(default)]
    pub name: Option<String>,
    /// Date-like text, e.g. `2024-05-01`.
    #[serde(default)]
    pub date: Option<String>,
}

impl Conference {
    /// Creates an unsaved conference with both descriptive fields set.
    pub fn new(name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            date: Some(date.into()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Merges non-empty fields of `patch` into this record.
    ///
    /// Fields absent from the patch keep their stored value, and `id` is left
    /// untouched even when the patch carries one.
    pub fn apply_patch(&mut self, patch: &Conference) {
        if let Some(name) = &patch.name {
            self.name = Some(name.clone());
        }
        if let Some(date) = &patch.date {
            self.date = Some(date.clone());
        }
    }

    /// Checks that this record can be created as a new conference.
    ///
    /// # Errors
    /// - `IdExists` when the record already carries an id.
    pub fn validate_new(&self) -> Result<(), ConferenceValidationError> {
        match self.id {
            Some(_) => Err(ConferenceValidationError::IdExists),
            None => Ok(()),
        }
    }

    /// Checks that this record can update the conference addressed by `path_id`.
    ///
    /// # Errors
    /// - `IdNull` when the record carries no id.
    /// - `IdMismatch` when the record id differs from `path_id`.
    pub fn validate_update(&self, path_id: ConferenceId) -> Result<(), ConferenceValidationError> {
        let Some(body_id) = self.id else {
            return Err(ConferenceValidationError::IdNull);
        };
        if body_id != path_id {
            return Err(ConferenceValidationError::IdMismatch { path_id, body_id });
        }
        Ok(())
    }
}

/// Identity rule violations for create/update requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConferenceValidationError {
    /// A new conference cannot already have an id.
    IdExists,
    /// An update must carry the id of the target conference.
    IdNull,
    /// Body id and addressed id differ.
    IdMismatch {
        path_id: ConferenceId,
        body_id: ConferenceId,
    },
}

impl ConferenceValidationError {
    /// Stable client-facing error key.
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::IdExists => "idexists",
            Self::IdNull => "idnull",
            Self::IdMismatch { .. } => "idinvalid",
        }
    }
}

impl Display for ConferenceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdExists => write!(f, "a new conference cannot already have an id"),
            Self::IdNull => write!(f, "invalid id: conference id is missing"),
            Self::IdMismatch { path_id, body_id } => write!(
                f,
                "invalid id: body id {body_id} does not match addressed id {path_id}"
            ),
        }
    }
}

impl Error for ConferenceValidationError {}
