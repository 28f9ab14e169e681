//! Conference use-case service.
//!
//! # Responsibility
//! - Provide the create/update/patch/get/list/delete use-cases.
//! - Enforce identity rules before any repository write.
//!
//! # Invariants
//! - Updates never create conferences; a missing target is `EntityNotFound`.
//! - Delete is idempotent.
//! - Service layer remains storage-agnostic.

use crate::model::conference::{Conference, ConferenceId, ConferenceValidationError};
use crate::repo::conference_repo::{ConferenceListQuery, ConferenceRepository, RepoError};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for conference use-cases.
#[derive(Debug)]
pub enum ConferenceServiceError {
    /// Request violates an identity rule.
    Validation(ConferenceValidationError),
    /// Update target does not exist.
    EntityNotFound(ConferenceId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl ConferenceServiceError {
    /// Stable client-facing error key, when the error is caused by the request.
    pub fn error_key(&self) -> Option<&'static str> {
        match self {
            Self::Validation(err) => Some(err.error_key()),
            Self::EntityNotFound(_) => Some("idnotfound"),
            Self::Repo(_) | Self::InconsistentState(_) => None,
        }
    }
}

impl Display for ConferenceServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EntityNotFound(id) => write!(f, "entity not found: conference {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent conference state: {details}")
            }
        }
    }
}

impl Error for ConferenceServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConferenceValidationError> for ConferenceServiceError {
    fn from(value: ConferenceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ConferenceServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::EntityNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ConferenceServiceError>;

/// One page of a conference listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferencePage {
    pub items: Vec<Conference>,
    /// Total number of stored conferences, independent of pagination.
    pub total: u64,
}

/// Conference service facade over repository implementations.
pub struct ConferenceService<R: ConferenceRepository> {
    repo: R,
}

impl<R: ConferenceRepository> ConferenceService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a new conference and returns it with its assigned id.
    pub fn create_conference(&self, conference: &Conference) -> ServiceResult<Conference> {
        debug!("event=conference_create module=service status=start");
        conference.validate_new()?;

        let created = self.repo.create_conference(conference)?;
        info!(
            "event=conference_create module=service status=ok id={}",
            created.id.unwrap_or_default()
        );
        Ok(created)
    }

    /// Replaces every field of the conference addressed by `path_id`.
    pub fn update_conference(
        &self,
        path_id: ConferenceId,
        conference: &Conference,
    ) -> ServiceResult<Conference> {
        debug!("event=conference_update module=service status=start id={path_id}");
        self.ensure_updatable(path_id, conference)?;

        let updated = self.repo.update_conference(conference)?;
        info!("event=conference_update module=service status=ok id={path_id}");
        Ok(updated)
    }

    /// Merges the non-empty fields of `patch` into the stored conference.
    pub fn partial_update_conference(
        &self,
        path_id: ConferenceId,
        patch: &Conference,
    ) -> ServiceResult<Conference> {
        debug!("event=conference_patch module=service status=start id={path_id}");
        self.ensure_updatable(path_id, patch)?;

        let mut stored = self
            .repo
            .get_conference(path_id)?
            .ok_or(ConferenceServiceError::EntityNotFound(path_id))?;
        stored.apply_patch(patch);

        let updated = self.repo.update_conference(&stored)?;
        if updated.id != Some(path_id) {
            return Err(ConferenceServiceError::InconsistentState(
                "patched conference id changed",
            ));
        }
        info!("event=conference_patch module=service status=ok id={path_id}");
        Ok(updated)
    }

    /// Gets one conference by id.
    pub fn get_conference(&self, id: ConferenceId) -> ServiceResult<Option<Conference>> {
        Ok(self.repo.get_conference(id)?)
    }

    /// Lists conferences with ordering and pagination.
    pub fn list_conferences(&self, query: &ConferenceListQuery) -> ServiceResult<ConferencePage> {
        let items = self.repo.list_conferences(query)?;
        let total = self.repo.count_conferences()?;
        Ok(ConferencePage { items, total })
    }

    /// Deletes a conference; deleting a missing id is not an error.
    pub fn delete_conference(&self, id: ConferenceId) -> ServiceResult<()> {
        let removed = self.repo.delete_conference(id)?;
        info!("event=conference_delete module=service status=ok id={id} removed={removed}");
        Ok(())
    }

    fn ensure_updatable(
        &self,
        path_id: ConferenceId,
        conference: &Conference,
    ) -> ServiceResult<()> {
        conference.validate_update(path_id)?;
        if !self.repo.exists(path_id)? {
            return Err(ConferenceServiceError::EntityNotFound(path_id));
        }
        Ok(())
    }
}
