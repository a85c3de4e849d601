use crate::api::MgmtState;
use crate::api::schemas::Envelope;
use crate::api::schemas::health::{ApiHealth, HealthResponse};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use time::OffsetDateTime;

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: checks that the user store answers.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let (status_code, store) = match state.health_service.check_store().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, component = "store", "Readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
    };

    let response = HealthResponse { status: if status_code == StatusCode::OK { "ok" } else { "error" }, store };
    (status_code, Json(response))
}

/// Unauthenticated heartbeat on the public API.
pub async fn api_health() -> impl IntoResponse {
    Json(Envelope::ok(ApiHealth { status: "ok", timestamp: OffsetDateTime::now_utc() }))
}
