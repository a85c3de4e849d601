use crate::api::AppState;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::AuthUser;
use crate::api::schemas::Envelope;
use crate::api::schemas::users::{
    PublicUser, RateUser, RatingResponse, StatsResponse, UpdateProfile, UpdateSkills, UserProfile, UserResponse,
};
use crate::error::{AppError, Result};
use axum::{Json, extract::State, response::IntoResponse};
use uuid::Uuid;

pub async fn get_profile(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let user = state.user_service.profile(auth_user.user_id).await?;
    Ok(Json(Envelope::ok(UserResponse { user: UserProfile::from(user) })))
}

pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UpdateProfile>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.update_profile(auth_user.user_id, payload.into()).await?;
    Ok(Json(Envelope::with_message("Profile updated successfully", UserResponse { user: UserProfile::from(user) })))
}

pub async fn update_skills(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UpdateSkills>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.update_skills(auth_user.user_id, payload.offers, payload.seeks).await?;
    Ok(Json(Envelope::with_message("Skills updated successfully", UserResponse { user: UserProfile::from(user) })))
}

pub async fn get_user(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.public_profile(user_id).await?;
    Ok(Json(Envelope::ok(UserResponse { user: PublicUser::from(user) })))
}

pub async fn get_stats(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let stats = state.user_service.stats(user_id).await?;
    Ok(Json(Envelope::ok(StatsResponse { stats: stats.into() })))
}

pub async fn rate_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RateUser>,
) -> Result<impl IntoResponse> {
    let (Some(ratee_id), Some(score)) = (payload.user_id, payload.score) else {
        return Err(AppError::bad_request("Valid userId and score (1-5) are required"));
    };
    let rating = state.user_service.rate(auth_user.user_id, ratee_id, score, payload.comment).await?;
    Ok(Json(Envelope::with_message("Rating submitted successfully", RatingResponse { rating: rating.into() })))
}
