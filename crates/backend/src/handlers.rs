use axum::Json;
use tuner_types::StatusResponse;

/// Liveness probe for the API.
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Bare heartbeat for load balancers.
pub async fn heartbeat() -> &'static str {
    "."
}
