//! HTTP error mapping.
//!
//! # Responsibility
//! - Translate core errors into status codes and problem JSON bodies.
//! - Tag client errors with an alert so the error header is emitted.
//!
//! # Invariants
//! - Internal error details are logged, never returned to clients.

use crate::headers::HeaderAlert;
use crate::ENTITY_NAME;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use conference_core::{ConferenceServiceError, InvalidSort, SearchError, ShapeError};
use log::error;
use serde::Serialize;
use std::fmt::{Display, Formatter};

const MEDIA_TYPE_ERROR_KEY: &str = "mediatype";
const PARAM_ERROR_KEY: &str = "paraminvalid";

#[derive(Debug)]
pub enum ApiError {
    /// Client error with a stable error key.
    BadRequest {
        error_key: &'static str,
        message: String,
        violations: Vec<String>,
    },
    NotFound,
    /// Request body media type is not accepted by the endpoint.
    UnsupportedMediaType(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(error_key: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            error_key,
            message: message.into(),
            violations: Vec::new(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest {
                error_key, message, ..
            } => write!(f, "bad request ({error_key}): {message}"),
            Self::NotFound => write!(f, "not found"),
            Self::UnsupportedMediaType(content_type) => {
                write!(f, "unsupported media type `{content_type}`")
            }
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Problem body returned for every error status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProblemBody {
    title: &'static str,
    status: u16,
    message: String,
    entity_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_key: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<String>,
}

impl ProblemBody {
    fn new(status: StatusCode, message: String) -> Self {
        Self {
            title: status.canonical_reason().unwrap_or("Error"),
            status: status.as_u16(),
            message,
            entity_name: ENTITY_NAME,
            error_key: None,
            detail: None,
            violations: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (body, alert) = match self {
            Self::BadRequest {
                error_key,
                message,
                violations,
            } => (
                ProblemBody {
                    error_key: Some(error_key),
                    detail: Some(message),
                    violations,
                    ..ProblemBody::new(status, format!("error.{error_key}"))
                },
                Some(HeaderAlert::Error(error_key)),
            ),
            Self::NotFound => (
                ProblemBody::new(status, format!("error.http.{}", status.as_u16())),
                None,
            ),
            Self::UnsupportedMediaType(content_type) => (
                ProblemBody {
                    error_key: Some(MEDIA_TYPE_ERROR_KEY),
                    detail: Some(format!("unsupported media type `{content_type}`")),
                    ..ProblemBody::new(status, format!("error.{MEDIA_TYPE_ERROR_KEY}"))
                },
                Some(HeaderAlert::Error(MEDIA_TYPE_ERROR_KEY)),
            ),
            Self::Internal(message) => {
                error!("event=api_error module=api status=error error={message}");
                (
                    ProblemBody::new(status, format!("error.http.{}", status.as_u16())),
                    None,
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(alert) = alert {
            response.extensions_mut().insert(alert);
        }
        response
    }
}

impl From<ConferenceServiceError> for ApiError {
    fn from(value: ConferenceServiceError) -> Self {
        match value.error_key() {
            Some(error_key) => Self::bad_request(error_key, value.to_string()),
            None => Self::Internal(value.to_string()),
        }
    }
}

impl From<ShapeError> for ApiError {
    fn from(value: ShapeError) -> Self {
        let violations = value
            .violations()
            .iter()
            .map(ToString::to_string)
            .collect();
        Self::BadRequest {
            error_key: "shape",
            message: value.to_string(),
            violations,
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::InvalidQuery { .. } => Self::bad_request("queryinvalid", value.to_string()),
            SearchError::Db(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<InvalidSort> for ApiError {
    fn from(value: InvalidSort) -> Self {
        Self::bad_request("sortinvalid", value.to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self::bad_request(PARAM_ERROR_KEY, value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::bad_request(PARAM_ERROR_KEY, value.body_text())
    }
}
