use crate::api::schemas::users::UserSummary;
use crate::domain::message::{Message, MessageKind};
use crate::domain::pagination::Pagination;
use crate::services::message_service::ConversationView;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub to_user_id: Option<Uuid>,
    pub content: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(alias = "q")]
    pub query: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub id: Uuid,
    pub from: Uuid,
    pub to: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub read: bool,
    #[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub read_at: Option<OffsetDateTime>,
}

impl From<Message> for MessageBody {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            from: message.sender_id,
            to: message.receiver_id,
            content: message.content,
            kind: message.kind,
            timestamp: message.timestamp,
            read: message.read,
            read_at: message.read_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationBody {
    pub partner_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<UserSummary>,
    pub last_message: MessageBody,
    pub unread_count: usize,
}

impl From<ConversationView> for ConversationBody {
    fn from(view: ConversationView) -> Self {
        Self {
            partner_id: view.conversation.partner_id,
            partner: view.partner.as_ref().map(UserSummary::from),
            last_message: view.conversation.last_message.into(),
            unread_count: view.conversation.unread_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationList {
    pub conversations: Vec<ConversationBody>,
}

#[derive(Debug, Serialize)]
pub struct MessageList {
    pub messages: Vec<MessageBody>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub message_data: MessageBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread_count: usize,
}
