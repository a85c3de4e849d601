use crate::api::schemas::users::UserSummary;
use crate::domain::pagination::Pagination;
use crate::domain::session::{Session, SessionStats, SessionStatus, SessionUpdate};
use crate::error::Result;
use crate::services::session_service::{SessionRequest, SessionView};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct SessionParams {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSession {
    pub with_user_id: Option<Uuid>,
    pub date: Option<String>,
    pub skill: Option<String>,
    pub notes: Option<String>,
}

impl From<CreateSession> for SessionRequest {
    fn from(body: CreateSession) -> Self {
        Self { with_user_id: body.with_user_id, date: body.date, skill: body.skill, notes: body.notes }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSession {
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl UpdateSession {
    /// # Errors
    /// Returns `AppError::BadRequest` for an unknown status.
    pub fn into_update(self) -> Result<SessionUpdate> {
        let status = self.status.as_deref().map(str::parse::<SessionStatus>).transpose()?;
        Ok(SessionUpdate { status, notes: self.notes })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    pub id: Uuid,
    pub partner_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<UserSummary>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub skill: String,
    pub status: SessionStatus,
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Session> for SessionBody {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            partner_id: session.partner_id,
            partner: None,
            date: session.date,
            skill: session.skill,
            status: session.status,
            notes: session.notes,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

impl From<SessionView> for SessionBody {
    fn from(view: SessionView) -> Self {
        let partner = view.partner.as_ref().map(UserSummary::from);
        Self { partner, ..Self::from(view.session) }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<SessionBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: SessionBody,
}

#[derive(Debug, Serialize)]
pub struct SessionStatsResponse {
    pub stats: SessionStats,
}
