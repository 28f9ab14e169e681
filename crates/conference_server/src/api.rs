//! REST API for conference resources.
//!
//! # Responsibility
//! - Expose the conference use-cases under `/api`.
//! - Check request bodies against the conference shape before decoding.
//!
//! # Invariants
//! - Handlers never hold the connection lock across an `.await`.
//! - Every client error response carries an error key.

use crate::error::ApiError;
use crate::headers::{apply_alert_headers, HeaderAlert};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Json, Router};
use conference_core::{
    core_version, search_conferences, Conference, ConferenceId, ConferenceListQuery,
    ConferenceService, ConferenceSort, SearchQuery, SqliteConferenceRepository,
};
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

pub const CONFERENCES_PATH: &str = "/api/conferences";
const SEARCH_LIMIT_MAX: u32 = 1000;

const X_TOTAL_COUNT: &str = "x-total-count";
const PATCH_MEDIA_TYPES: &[&str] = &["application/json", "application/merge-patch+json"];

/// Builds the API router over `state`.
pub fn router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route(
            CONFERENCES_PATH,
            get(list_conferences).post(create_conference),
        )
        .route(
            "/api/conferences/:id",
            get(get_conference)
                .put(update_conference)
                .patch(partial_update_conference)
                .delete(delete_conference),
        )
        .route("/api/_search/conferences", get(search))
        .route("/api/health", get(health))
        .layer(middleware::map_response_with_state(
            state.clone(),
            apply_alert_headers,
        ))
        .with_state(state);

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// `field[,asc|desc]`
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub limit: Option<u32>,
}

async fn create_conference(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let conference = parse_conference_body(&body)?;
    debug!("event=api_request module=api op=create_conference");

    let created = state
        .with_conn(move |conn| {
            let service = ConferenceService::new(SqliteConferenceRepository::new(conn));
            Ok(service.create_conference(&conference)?)
        })
        .await?;
    let id = created
        .id
        .ok_or_else(|| ApiError::internal("created conference has no id"))?;

    let response = (
        StatusCode::CREATED,
        [(header::LOCATION, format!("{CONFERENCES_PATH}/{id}"))],
        Json(created),
    );
    Ok(with_alert(response, HeaderAlert::Created(id.to_string())))
}

async fn update_conference(
    State(state): State<AppState>,
    path: Result<Path<ConferenceId>, PathRejection>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    let conference = parse_conference_body(&body)?;
    debug!("event=api_request module=api op=update_conference id={id}");

    let updated = state
        .with_conn(move |conn| {
            let service = ConferenceService::new(SqliteConferenceRepository::new(conn));
            Ok(service.update_conference(id, &conference)?)
        })
        .await?;

    Ok(with_alert(Json(updated), HeaderAlert::Updated(id.to_string())))
}

async fn partial_update_conference(
    State(state): State<AppState>,
    path: Result<Path<ConferenceId>, PathRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    ensure_patch_media_type(&headers)?;
    let patch = parse_conference_body(&body)?;
    debug!("event=api_request module=api op=partial_update_conference id={id}");

    let updated = state
        .with_conn(move |conn| {
            let service = ConferenceService::new(SqliteConferenceRepository::new(conn));
            Ok(service.partial_update_conference(id, &patch)?)
        })
        .await?;

    Ok(with_alert(Json(updated), HeaderAlert::Updated(id.to_string())))
}

async fn list_conferences(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let sort = match params.sort.as_deref() {
        Some(raw) => raw.parse::<ConferenceSort>()?,
        None => ConferenceSort::default(),
    };
    let query = ConferenceListQuery {
        sort,
        limit: params.limit,
        offset: params.offset.unwrap_or(0),
    };
    debug!("event=api_request module=api op=list_conferences");

    let page = state
        .with_conn(move |conn| {
            let service = ConferenceService::new(SqliteConferenceRepository::new(conn));
            Ok(service.list_conferences(&query)?)
        })
        .await?;

    Ok((
        [(X_TOTAL_COUNT, page.total.to_string())],
        Json(page.items),
    )
        .into_response())
}

async fn get_conference(
    State(state): State<AppState>,
    path: Result<Path<ConferenceId>, PathRejection>,
) -> Result<Json<Conference>, ApiError> {
    let Path(id) = path?;
    debug!("event=api_request module=api op=get_conference id={id}");
    let conference = state
        .with_conn(move |conn| {
            let service = ConferenceService::new(SqliteConferenceRepository::new(conn));
            Ok(service.get_conference(id)?)
        })
        .await?;

    conference.map(Json).ok_or(ApiError::NotFound)
}

async fn delete_conference(
    State(state): State<AppState>,
    path: Result<Path<ConferenceId>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    debug!("event=api_request module=api op=delete_conference id={id}");
    state
        .with_conn(move |conn| {
            let service = ConferenceService::new(SqliteConferenceRepository::new(conn));
            Ok(service.delete_conference(id)?)
        })
        .await?;

    Ok(with_alert(
        StatusCode::NO_CONTENT,
        HeaderAlert::Deleted(id.to_string()),
    ))
}

async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Conference>>, ApiError> {
    let Query(params) = params?;
    debug!("event=api_request module=api op=search_conferences");
    let mut query = SearchQuery::new(params.query);
    if let Some(limit) = params.limit {
        query.limit = limit.min(SEARCH_LIMIT_MAX);
    }

    let hits = state
        .with_conn(move |conn| Ok(search_conferences(conn, &query)?))
        .await?;

    Ok(Json(hits.into_iter().map(|hit| hit.conference).collect()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP", "version": core_version() }))
}

/// Parses a JSON body and checks it against the conference shape.
fn parse_conference_body(body: &[u8]) -> Result<Conference, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| ApiError::bad_request("json", format!("malformed JSON body: {err}")))?;
    Ok(Conference::from_json_value(&value)?)
}

/// Accepts JSON and JSON merge-patch bodies, ignoring media type parameters.
fn ensure_patch_media_type(headers: &HeaderMap) -> Result<(), ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if PATCH_MEDIA_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(ApiError::UnsupportedMediaType(content_type.to_string()))
    }
}

fn with_alert(response: impl IntoResponse, alert: HeaderAlert) -> Response {
    let mut response = response.into_response();
    response.extensions_mut().insert(alert);
    response
}

#[cfg(test)]
mod tests {
    use super::{ensure_patch_media_type, parse_conference_body};
    use crate::error::ApiError;
    use axum::http::{header, HeaderMap, HeaderValue};

    #[test]
    fn body_parsing_reports_malformed_json() {
        let err = parse_conference_body(b"{not json").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { error_key: "json", .. }));
    }

    #[test]
    fn body_parsing_reports_shape_violations() {
        let err = parse_conference_body(br#"{"id":"1","name":2}"#).unwrap_err();
        match err {
            ApiError::BadRequest {
                error_key,
                violations,
                ..
            } => {
                assert_eq!(error_key, "shape");
                assert_eq!(violations.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn body_parsing_accepts_partial_records() {
        let conference = parse_conference_body(br#"{"name":"DevCon"}"#).unwrap();
        assert_eq!(conference.name.as_deref(), Some("DevCon"));
        assert_eq!(conference.id, None);
    }

    fn content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn patch_accepts_json_and_merge_patch_media_types() {
        assert!(ensure_patch_media_type(&content_type("application/json")).is_ok());
        assert!(ensure_patch_media_type(&content_type(
            "Application/Merge-Patch+JSON; charset=utf-8"
        ))
        .is_ok());
    }

    #[test]
    fn patch_rejects_other_or_missing_media_types() {
        let err = ensure_patch_media_type(&content_type("text/plain")).unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMediaType(ref value) if value == "text/plain"));
        assert!(matches!(
            ensure_patch_media_type(&HeaderMap::new()),
            Err(ApiError::UnsupportedMediaType(_))
        ));
    }
}
