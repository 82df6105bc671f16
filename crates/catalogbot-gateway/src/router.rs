//! Axum router wiring.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{api, app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .route("/portal-metrics", get(api::get_portal_metrics))
        .route("/portal-metrics/reset", post(api::reset_portal_metrics))
        .route("/portal-metrics/events", post(api::ingest_event))
        .with_state(state)
}
