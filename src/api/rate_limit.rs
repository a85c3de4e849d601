use crate::api::AppState;
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderName, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

const X_RATELIMIT_AFTER: HeaderName = HeaderName::from_static("x-ratelimit-after");

/// Records the limiter's decision and renders throttled requests in the
/// standard error envelope, keeping the limiter's retry headers.
pub async fn log_rate_limit_events(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .or_else(|| response.headers().get(&X_RATELIMIT_AFTER))
        .and_then(|v| v.to_str().ok());
    state.rate_limit_service.log_decision(status, retry_after);

    if status != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let mut throttled = AppError::RateLimited.into_response();
    for name in [header::RETRY_AFTER, X_RATELIMIT_AFTER] {
        if let Some(value) = response.headers().get(&name) {
            throttled.headers_mut().insert(name, value.clone());
        }
    }
    throttled
}
