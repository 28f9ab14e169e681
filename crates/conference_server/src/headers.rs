//! Alert header conventions.
//!
//! Handlers and error responses attach a [`HeaderAlert`] to the response
//! extensions; [`apply_alert_headers`] turns it into `X-<app>-alert`,
//! `X-<app>-error` and `X-<app>-params` headers, where `<app>` is the
//! configured application name.

use crate::state::AppState;
use crate::ENTITY_NAME;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::Response;
use log::warn;

/// Outcome to announce through response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderAlert {
    /// Entity created; carries the new id.
    Created(String),
    Updated(String),
    Deleted(String),
    /// Client error; carries the error key.
    Error(&'static str),
}

impl HeaderAlert {
    /// Header `(name, value)` pairs for `application_name`.
    pub fn header_pairs(&self, application_name: &str) -> Vec<(String, String)> {
        let alert_name = format!("x-{application_name}-alert");
        let params_name = format!("x-{application_name}-params");
        let entity_message =
            |action: &str| format!("{application_name}.{ENTITY_NAME}.{action}");

        match self {
            Self::Created(id) => vec![
                (alert_name, entity_message("created")),
                (params_name, id.clone()),
            ],
            Self::Updated(id) => vec![
                (alert_name, entity_message("updated")),
                (params_name, id.clone()),
            ],
            Self::Deleted(id) => vec![
                (alert_name, entity_message("deleted")),
                (params_name, id.clone()),
            ],
            Self::Error(error_key) => vec![
                (
                    format!("x-{application_name}-error"),
                    format!("error.{error_key}"),
                ),
                (params_name, ENTITY_NAME.to_string()),
            ],
        }
    }
}

/// Response middleware that materializes a pending [`HeaderAlert`].
pub async fn apply_alert_headers(State(state): State<AppState>, mut response: Response) -> Response {
    let Some(alert) = response.extensions_mut().remove::<HeaderAlert>() else {
        return response;
    };

    for (name, value) in alert.header_pairs(state.application_name()) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!("event=alert_header module=api status=skipped header={name}"),
        }
    }
    response
}
