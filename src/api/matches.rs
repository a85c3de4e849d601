use crate::api::AppState;
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::schemas::Envelope;
use crate::api::schemas::matches::{CategoryList, LimitParams, MatchList, MatchParams, MatchResponse, MatchView};
use crate::domain::matching::SortKey;
use crate::error::Result;
use crate::services::match_service::{DEFAULT_SUGGESTED_LIMIT, MatchQuery};
use axum::{Json, extract::State, response::IntoResponse};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 20;

pub async fn list_matches(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<MatchParams>,
) -> Result<impl IntoResponse> {
    let page = state.page_request(params.page, params.limit, DEFAULT_PAGE_SIZE)?;
    let sort = params.sort_by.as_deref().map(str::parse::<SortKey>).transpose()?.unwrap_or_default();
    let query = MatchQuery { search: params.search, category: params.category, sort };

    let page = state.match_service.list(auth_user.user_id, query, page).await?;
    let page = page.map(MatchView::from);
    Ok(Json(Envelope::ok(MatchList { matches: page.items, pagination: Some(page.pagination) })))
}

pub async fn suggested_matches(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> Result<impl IntoResponse> {
    let limit = state.clamp_limit(params.limit.unwrap_or(DEFAULT_SUGGESTED_LIMIT));
    let matches = state.match_service.suggested(auth_user.user_id, limit).await?;
    let matches = matches.into_iter().map(MatchView::from).collect();
    Ok(Json(Envelope::ok(MatchList { matches, pagination: None })))
}

pub async fn get_match(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(match_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate = state.match_service.get(auth_user.user_id, match_id).await?;
    Ok(Json(Envelope::ok(MatchResponse { candidate: MatchView::detailed(candidate) })))
}

pub async fn list_categories(_auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories = state.match_service.categories().await?;
    Ok(Json(Envelope::ok(CategoryList { categories })))
}
