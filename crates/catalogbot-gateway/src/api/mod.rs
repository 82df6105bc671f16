//! Dashboard and ingest endpoints.
//!
//! - `GET  /portal-metrics`        : snapshot JSON
//! - `POST /portal-metrics/reset`  : clear counters and logs
//! - `POST /portal-metrics/events` : record one outcome event
//!
//! All three require `X-API-KEY` when keys are configured.

pub mod error;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use catalogbot_core::error::CatalogBotError;
use catalogbot_core::RawEvent;

use crate::app_state::AppState;
use crate::obs::MetricsSnapshot;

pub use error::{ApiError, ApiResult};

pub const API_KEY_HEADER: &str = "x-api-key";

fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

pub async fn get_portal_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<MetricsSnapshot>> {
    state.authorize("/portal-metrics", api_key(&headers))?;
    Ok(Json(state.aggregator().snapshot()))
}

pub async fn reset_portal_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    state.authorize("/portal-metrics/reset", api_key(&headers))?;
    state.reset();
    Ok(Json(json!({ "success": true })))
}

pub async fn ingest_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    state.authorize("/portal-metrics/events", api_key(&headers))?;

    let raw: RawEvent = serde_json::from_slice(&body)
        .map_err(|e| CatalogBotError::BadRequest(format!("invalid event body: {e}")))?;
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());

    state.record_raw(raw, referer)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "accepted": true }))))
}
