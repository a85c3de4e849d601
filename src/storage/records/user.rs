use crate::domain::message::Message;
use crate::domain::rating::Rating;
use crate::domain::session::Session;
use crate::domain::user::{Location, Preferences, User};
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) name: String,
    pub(crate) bio: Option<String>,
    pub(crate) offers: Vec<String>,
    pub(crate) seeks: Vec<String>,
    pub(crate) location: Json<Location>,
    pub(crate) preferences: Json<Preferences>,
    pub(crate) sessions: Json<Vec<Session>>,
    pub(crate) ratings: Json<Vec<Rating>>,
    pub(crate) messages: Json<Vec<Message>>,
    pub(crate) is_online: bool,
    pub(crate) last_active: OffsetDateTime,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            password_hash: record.password_hash,
            name: record.name,
            bio: record.bio,
            offers: record.offers,
            seeks: record.seeks,
            location: record.location.0,
            preferences: record.preferences.0,
            sessions: record.sessions.0,
            ratings: record.ratings.0,
            messages: record.messages.0,
            is_online: record.is_online,
            last_active: record.last_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
