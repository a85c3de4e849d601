use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
}

/// A message as stored in one participant's mailbox. Sender and receiver
/// each hold their own copy with its own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub read: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
}

impl Message {
    /// # Errors
    /// Returns `AppError::BadRequest` for blank content.
    pub fn new(sender_id: Uuid, receiver_id: Uuid, content: &str, kind: MessageKind, now: OffsetDateTime) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::bad_request("toUserId and content are required"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: content.to_string(),
            kind,
            timestamp: now,
            read: false,
            read_at: None,
        })
    }

    /// Same message for the other participant's mailbox.
    #[must_use]
    pub fn copy_for_mailbox(&self) -> Self {
        Self { id: Uuid::new_v4(), ..self.clone() }
    }

    /// The participant that isn't `owner_id`.
    #[must_use]
    pub fn partner_of(&self, owner_id: Uuid) -> Uuid {
        if self.sender_id == owner_id { self.receiver_id } else { self.sender_id }
    }

    #[must_use]
    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == b) || (self.sender_id == b && self.receiver_id == a)
    }

    #[must_use]
    pub fn is_unread_for(&self, owner_id: Uuid) -> bool {
        self.receiver_id == owner_id && !self.read
    }

    /// Returns true if the message changed.
    pub fn mark_read(&mut self, now: OffsetDateTime) -> bool {
        if self.read {
            return false;
        }
        self.read = true;
        self.read_at = Some(now);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub partner_id: Uuid,
    pub last_message: Message,
    pub unread_count: usize,
}

/// Groups `owner_id`'s mailbox by partner, most recent conversation first.
#[must_use]
pub fn conversations(owner_id: Uuid, messages: &[Message]) -> Vec<Conversation> {
    let mut by_partner: HashMap<Uuid, Conversation> = HashMap::new();

    for message in messages {
        let partner_id = message.partner_of(owner_id);
        let unread = usize::from(message.sender_id == partner_id && message.is_unread_for(owner_id));
        by_partner
            .entry(partner_id)
            .and_modify(|c| {
                if message.timestamp > c.last_message.timestamp {
                    c.last_message = message.clone();
                }
                c.unread_count += unread;
            })
            .or_insert_with(|| Conversation { partner_id, last_message: message.clone(), unread_count: unread });
    }

    let mut list: Vec<Conversation> = by_partner.into_values().collect();
    list.sort_by(|a, b| b.last_message.timestamp.cmp(&a.last_message.timestamp));
    list
}

/// Messages exchanged with `partner_id`, oldest first.
#[must_use]
pub fn thread(owner_id: Uuid, partner_id: Uuid, messages: &[Message]) -> Vec<Message> {
    let mut thread: Vec<Message> = messages.iter().filter(|m| m.is_between(owner_id, partner_id)).cloned().collect();
    thread.sort_by_key(|m| m.timestamp);
    thread
}

/// Case-insensitive content match, newest first.
#[must_use]
pub fn search(query: &str, messages: &[Message]) -> Vec<Message> {
    let needle = query.to_lowercase();
    let mut found: Vec<Message> =
        messages.iter().filter(|m| m.content.to_lowercase().contains(&needle)).cloned().collect();
    found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    found
}
