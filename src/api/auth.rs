use crate::api::AppState;
use crate::api::extract::ApiJson;
use crate::api::middleware::AuthUser;
use crate::api::schemas::auth::{AuthResponse, Login, Register};
use crate::api::schemas::users::{UserProfile, UserResponse};
use crate::api::schemas::{Empty, Envelope};
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

pub async fn register(State(state): State<AppState>, ApiJson(payload): ApiJson<Register>) -> Result<impl IntoResponse> {
    let outcome = state.account_service.register(payload.into()).await?;
    let body = Envelope::with_message("User registered successfully", AuthResponse::from(outcome));
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn login(State(state): State<AppState>, ApiJson(payload): ApiJson<Login>) -> Result<impl IntoResponse> {
    let outcome = state.account_service.login(&payload.email, &payload.password).await?;
    Ok(Json(Envelope::with_message("Login successful", AuthResponse::from(outcome))))
}

pub async fn verify(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let user = state.account_service.verify(auth_user.user_id).await?;
    Ok(Json(Envelope::ok(UserResponse { user: UserProfile::from(user) })))
}

pub async fn logout(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.account_service.logout(auth_user.user_id).await?;
    Ok(Json(Envelope::with_message("Logout successful", Empty {})))
}
