use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::models::HealthResponse;

use super::{state::API_VERSION, AppState};

/// Health check including a score store round-trip
///
/// Always answers 200; the body says whether the store is reachable.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database_connected = state.recommendations.store_reachable().await;

    Json(HealthResponse {
        status: if database_connected {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: Utc::now(),
        database_connected,
        version: API_VERSION.to_string(),
    })
}

/// Readiness check
pub async fn readiness_check() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}

/// Liveness check
pub async fn liveness_check() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

/// Service banner at `/`
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Card Recommendation API",
        "version": API_VERSION,
        "status": "running"
    }))
}
