//! Operational and ingest HTTP endpoints.
//!
//! - `/healthz`        : liveness
//! - `/readyz`         : readiness (503 when draining)
//! - `/metrics`        : Prometheus text format
//! - `/v1/counter`, `/v1/gauge`, `/v1/histogram` : JSON `UpdatePayload` ingest
//! - `/v1/wipe`        : drop every metric

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use promstore_core::error::{ErrorCode, Result, StoreError};
use promstore_core::{MetricStorage, UpdatePayload};

use crate::app_state::AppState;
use crate::exposition;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else {
        (StatusCode::OK, "ready")
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.store().collect() {
        Ok(families) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, exposition::CONTENT_TYPE)],
            exposition::render(&families),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn update_counter(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdatePayload>, JsonRejection>,
) -> Response {
    apply(payload, |p| state.store().update_counter(p))
}

pub async fn update_gauge(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdatePayload>, JsonRejection>,
) -> Response {
    apply(payload, |p| state.store().update_gauge(p))
}

pub async fn update_histogram(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdatePayload>, JsonRejection>,
) -> Response {
    apply(payload, |p| state.store().update_histogram(p))
}

pub async fn wipe(State(state): State<AppState>) -> Response {
    match state.store().wipe() {
        Ok(()) => {
            tracing::info!("metric store wiped");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(&e),
    }
}

fn apply(
    payload: std::result::Result<Json<UpdatePayload>, JsonRejection>,
    update: impl FnOnce(&UpdatePayload) -> Result<()>,
) -> Response {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            let e = StoreError::InvalidMetricData(rejection.body_text());
            tracing::warn!(error = %e, "update payload rejected");
            return error_response(&e);
        }
    };

    match update(&payload) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::warn!(metric = %payload.name, error = %e, "update rejected");
            error_response(&e)
        }
    }
}

fn error_response(e: &StoreError) -> Response {
    let status = match e.code() {
        ErrorCode::InvalidMetricData => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = json!({
        "code": e.code().as_str(),
        "msg": e.to_string(),
    });
    (status, Json(body)).into_response()
}
