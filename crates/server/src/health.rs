//! Liveness endpoint reporting which provider the gateway settled on.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use sheetwise_core::config::ProviderKind;

#[derive(Clone)]
struct HealthState {
    provider: ProviderKind,
    model: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    provider: &'static str,
    model: String,
    checked_at: String,
}

pub fn router(provider: ProviderKind, model: String) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { provider, model })
}

async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let body = HealthResponse {
        status: "ok",
        provider: state.provider.as_str(),
        model: state.model.clone(),
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(body))
}
