//! # Health Check Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::web::state::AppState;

/// Liveness: GET /health
pub async fn basic_health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Broker status: GET /health/rabbitmq
///
/// 503 when the service started without a publisher or lost its connection.
pub async fn rabbitmq_health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.tasks.messaging_available() {
        (StatusCode::OK, Json(json!({ "rabbitmq": "healthy" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "rabbitmq": "unhealthy" })),
        )
    }
}
