use crate::api::rate_limit::log_rate_limit_events;
use crate::config::Config;
use crate::domain::pagination::PageRequest;
use crate::error::Result;
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::health_service::HealthService;
use crate::services::match_service::MatchService;
use crate::services::message_service::MessageService;
use crate::services::rate_limit_service::RateLimitService;
use crate::services::session_service::SessionService;
use crate::services::user_service::UserService;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod extract;
pub mod health;
pub mod matches;
pub mod messages;
pub mod middleware;
pub mod rate_limit;
pub mod schemas;
pub mod sessions;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub match_service: MatchService,
    pub session_service: SessionService,
    pub message_service: MessageService,
    pub rate_limit_service: RateLimitService,
}

impl AppState {
    /// Validates `page`/`limit`, capping `limit` at the configured maximum.
    pub(crate) fn page_request(&self, page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Result<PageRequest> {
        PageRequest::new(page, limit, default_limit, self.config.pagination.max_page_size)
    }

    pub(crate) fn clamp_limit(&self, limit: usize) -> usize {
        limit.clamp(1, self.config.pagination.max_page_size as usize)
    }
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub match_service: MatchService,
    pub session_service: SessionService,
    pub message_service: MessageService,
    pub rate_limit_service: RateLimitService,
}

/// Configures and returns the primary application router.
///
/// # Panics
/// Panics if the rate limiter configuration cannot be constructed.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let std_interval_ns = 1_000_000_000 / config.rate_limit.per_second.max(1);
    let standard_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(std_interval_ns))
            .burst_size(config.rate_limit.burst)
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .expect("Failed to build standard rate limiter config"),
    );

    // Registration and login hash passwords, so they get their own, stricter bucket.
    let auth_interval_ns = 1_000_000_000 / config.rate_limit.auth_per_second.max(1);
    let auth_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(auth_interval_ns))
            .burst_size(config.rate_limit.auth_burst)
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .expect("Failed to build auth rate limiter config"),
    );

    let state = AppState {
        config,
        account_service: services.account_service,
        auth_service: services.auth_service,
        user_service: services.user_service,
        match_service: services.match_service,
        session_service: services.session_service,
        message_service: services.message_service,
        rate_limit_service: services.rate_limit_service,
    };

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .layer(GovernorLayer::new(auth_conf));

    let api_routes = Router::new()
        .route("/auth/verify", get(auth::verify))
        .route("/auth/logout", post(auth::logout))
        .route("/users/profile", get(users::get_profile).put(users::update_profile))
        .route("/users/skills", put(users::update_skills))
        .route("/users/stats/{userId}", get(users::get_stats))
        .route("/users/rate", post(users::rate_user))
        .route("/users/{userId}", get(users::get_user))
        .route("/matches", get(matches::list_matches))
        .route("/matches/suggested", get(matches::suggested_matches))
        .route("/matches/categories/list", get(matches::list_categories))
        .route("/matches/{matchId}", get(matches::get_match))
        .route("/sessions", get(sessions::list_sessions).post(sessions::create_session))
        .route("/sessions/stats/overview", get(sessions::session_stats))
        .route("/sessions/upcoming", get(sessions::upcoming_sessions))
        .route("/sessions/{sessionId}", put(sessions::update_session).delete(sessions::delete_session))
        .route("/messages/conversations", get(messages::list_conversations))
        .route("/messages/conversation/{userId}", get(messages::get_thread))
        .route("/messages/send", post(messages::send_message))
        .route("/messages/read/{messageId}", put(messages::mark_read))
        .route("/messages/unread/count", get(messages::unread_count))
        .route("/messages/search", get(messages::search_messages))
        .route("/messages/{messageId}", delete(messages::delete_message))
        .layer(GovernorLayer::new(standard_conf));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/api", auth_routes.merge(api_routes).route("/health", get(health::api_health)))
        .layer(from_fn_with_state(state.clone(), log_rate_limit_events))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        let status = response.status();
                        span.record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
