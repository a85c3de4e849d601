use crate::api::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::schemas::messaging::{
    ConversationBody, ConversationList, MessageBody, MessageList, SearchParams, SendMessage, SentMessage, UnreadCount,
};
use crate::api::schemas::{Empty, Envelope, PageParams};
use crate::error::{AppError, Result};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

const DEFAULT_THREAD_PAGE_SIZE: u32 = 50;
const DEFAULT_SEARCH_PAGE_SIZE: u32 = 20;

pub async fn list_conversations(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let conversations = state.message_service.conversations(auth_user.user_id).await?;
    let conversations = conversations.into_iter().map(ConversationBody::from).collect();
    Ok(Json(Envelope::ok(ConversationList { conversations })))
}

pub async fn get_thread(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(partner_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<impl IntoResponse> {
    let page = state.page_request(params.page, params.limit, DEFAULT_THREAD_PAGE_SIZE)?;
    let page = state.message_service.thread(auth_user.user_id, partner_id, page).await?.map(MessageBody::from);
    Ok(Json(Envelope::ok(MessageList { messages: page.items, pagination: page.pagination })))
}

pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SendMessage>,
) -> Result<impl IntoResponse> {
    let (Some(receiver_id), Some(content)) = (payload.to_user_id, payload.content) else {
        return Err(AppError::bad_request("toUserId and content are required"));
    };
    let message = state.message_service.send(auth_user.user_id, receiver_id, &content, payload.kind).await?;
    let body = Envelope::with_message("Message sent successfully", SentMessage { message_data: message.into() });
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(message_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.message_service.mark_read(auth_user.user_id, message_id).await?;
    Ok(Json(Envelope::with_message("Message marked as read", Empty {})))
}

pub async fn unread_count(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let unread_count = state.message_service.unread_count(auth_user.user_id).await?;
    Ok(Json(Envelope::ok(UnreadCount { unread_count })))
}

pub async fn delete_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(message_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.message_service.delete(auth_user.user_id, message_id).await?;
    Ok(Json(Envelope::with_message("Message deleted successfully", Empty {})))
}

pub async fn search_messages(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<impl IntoResponse> {
    let page = state.page_request(params.page, params.limit, DEFAULT_SEARCH_PAGE_SIZE)?;
    let query = params.query.unwrap_or_default();
    let page = state.message_service.search(auth_user.user_id, &query, page).await?.map(MessageBody::from);
    Ok(Json(Envelope::ok(MessageList { messages: page.items, pagination: page.pagination })))
}
