//! Axum router wiring.
//!
//! Ingest routes accept JSON update payloads; ops routes serve health and the
//! text exposition.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .route("/v1/counter", post(ops::update_counter))
        .route("/v1/gauge", post(ops::update_gauge))
        .route("/v1/histogram", post(ops::update_histogram))
        .route("/v1/wipe", post(ops::wipe))
        .with_state(state)
}
