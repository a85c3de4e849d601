use crate::api::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::schemas::matches::LimitParams;
use crate::api::schemas::sessions::{
    CreateSession, SessionBody, SessionList, SessionParams, SessionResponse, SessionStatsResponse, UpdateSession,
};
use crate::api::schemas::{Empty, Envelope};
use crate::domain::session::SessionStatus;
use crate::error::Result;
use crate::services::session_service::DEFAULT_UPCOMING_LIMIT;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 20;

pub async fn list_sessions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SessionParams>,
) -> Result<impl IntoResponse> {
    let page = state.page_request(params.page, params.limit, DEFAULT_PAGE_SIZE)?;
    let status = params.status.as_deref().map(str::parse::<SessionStatus>).transpose()?;

    let page = state.session_service.list(auth_user.user_id, status, page).await?;
    let page = page.map(SessionBody::from);
    Ok(Json(Envelope::ok(SessionList { sessions: page.items, pagination: Some(page.pagination) })))
}

pub async fn create_session(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateSession>,
) -> Result<impl IntoResponse> {
    let view = state.session_service.create(auth_user.user_id, payload.into()).await?;
    let body = Envelope::with_message("Session created successfully", SessionResponse { session: view.into() });
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn update_session(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateSession>,
) -> Result<impl IntoResponse> {
    let update = payload.into_update()?;
    let session = state.session_service.update(auth_user.user_id, session_id, update).await?;
    Ok(Json(Envelope::with_message("Session updated successfully", SessionResponse { session: session.into() })))
}

pub async fn delete_session(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.session_service.delete(auth_user.user_id, session_id).await?;
    Ok(Json(Envelope::with_message("Session deleted successfully", Empty {})))
}

pub async fn session_stats(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.session_service.stats(auth_user.user_id).await?;
    Ok(Json(Envelope::ok(SessionStatsResponse { stats })))
}

pub async fn upcoming_sessions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> Result<impl IntoResponse> {
    let limit = state.clamp_limit(params.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT));
    let sessions = state.session_service.upcoming(auth_user.user_id, limit).await?;
    let sessions = sessions.into_iter().map(SessionBody::from).collect();
    Ok(Json(Envelope::ok(SessionList { sessions, pagination: None })))
}
