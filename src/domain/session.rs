use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

/// Window used by [`SessionStats::recent_sessions`].
pub const RECENT_WINDOW: Duration = Duration::days(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl SessionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// `pending -> confirmed -> completed`, and `pending|confirmed -> cancelled`.
    /// Staying in the current status is always allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next
            || matches!(
                (self, next),
                (Self::Pending, Self::Confirmed)
                    | (Self::Confirmed, Self::Completed)
                    | (Self::Pending | Self::Confirmed, Self::Cancelled)
            )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::bad_request("Valid status is required (pending, confirmed, completed, cancelled)")),
        }
    }
}

/// One side of a scheduled exchange. The counterpart holds a mirror with
/// `partner_id` pointing back; the pair is joined on `(partner_id, date, skill)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub partner_id: Uuid,
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

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    pub status: Option<SessionStatus>,
    pub notes: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(partner_id: Uuid, date: OffsetDateTime, skill: String, notes: String, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            partner_id,
            date,
            skill,
            status: SessionStatus::Pending,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// The counterpart's copy: same date/skill/status/notes, fresh id, pointing at `owner_id`.
    #[must_use]
    pub fn mirror(&self, owner_id: Uuid) -> Self {
        Self { id: Uuid::new_v4(), partner_id: owner_id, ..self.clone() }
    }

    /// True if this record is the counterpart copy of a session owned by `owner_id`.
    #[must_use]
    pub fn mirrors(&self, owner_id: Uuid, original: &Self) -> bool {
        self.partner_id == owner_id && self.date == original.date && self.skill == original.skill
    }

    /// # Errors
    /// Returns `AppError::BadRequest` if the status change is not allowed.
    pub fn check_update(&self, update: &SessionUpdate) -> Result<()> {
        if let Some(next) = update.status
            && !self.status.can_transition_to(next)
        {
            return Err(AppError::BadRequest(format!("Cannot change session status from {} to {next}", self.status)));
        }
        Ok(())
    }

    pub fn apply(&mut self, update: &SessionUpdate, now: OffsetDateTime) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(notes) = &update.notes {
            self.notes.clone_from(notes);
        }
        self.updated_at = now;
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (read as UTC) or a bare `YYYY-MM-DD`.
#[must_use]
pub fn parse_session_date(input: &str) -> Option<OffsetDateTime> {
    let input = input.trim();
    if let Ok(dt) = OffsetDateTime::parse(input, &Rfc3339) {
        return Some(dt);
    }
    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    if let Ok(dt) = PrimitiveDateTime::parse(input, with_seconds) {
        return Some(dt.assume_utc());
    }
    if let Ok(dt) = PrimitiveDateTime::parse(input, without_seconds) {
        return Some(dt.assume_utc());
    }
    Date::parse(input, format_description!("[year]-[month]-[day]")).ok().map(|d| d.midnight().assume_utc())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub completion_rate: u32,
    pub recent_sessions: usize,
}

impl SessionStats {
    #[must_use]
    pub fn compute(sessions: &[Session], now: OffsetDateTime) -> Self {
        let mut stats = Self { total: sessions.len(), ..Self::default() };
        let window_start = now - RECENT_WINDOW;

        for session in sessions {
            match session.status {
                SessionStatus::Pending => stats.pending += 1,
                SessionStatus::Confirmed => stats.confirmed += 1,
                SessionStatus::Completed => stats.completed += 1,
                SessionStatus::Cancelled => stats.cancelled += 1,
            }
            if session.date >= window_start && session.date <= now {
                stats.recent_sessions += 1;
            }
        }

        let non_cancelled = stats.total - stats.cancelled;
        if non_cancelled > 0 {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let rate = ((stats.completed as f64 / non_cancelled as f64) * 100.0).round() as u32;
            stats.completion_rate = rate;
        }
        stats
    }
}

/// Open sessions dated at or after `now`, soonest first.
#[must_use]
pub fn upcoming(sessions: &[Session], now: OffsetDateTime, limit: usize) -> Vec<Session> {
    let mut open: Vec<Session> = sessions
        .iter()
        .filter(|s| s.date >= now && matches!(s.status, SessionStatus::Pending | SessionStatus::Confirmed))
        .cloned()
        .collect();
    open.sort_by_key(|s| s.date);
    open.truncate(limit);
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn session_at(date: OffsetDateTime, status: SessionStatus) -> Session {
        let mut s = Session::new(Uuid::new_v4(), date, "Guitar".into(), String::new(), date);
        s.status = status;
        s
    }

    #[test]
    fn test_state_machine() {
        use SessionStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(Completed.can_transition_to(Completed));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("confirmed".parse::<SessionStatus>().unwrap(), SessionStatus::Confirmed);
        assert!("done".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn test_parse_session_date_formats() {
        assert_eq!(parse_session_date("2025-03-01T10:30:00Z"), Some(datetime!(2025-03-01 10:30 UTC)));
        assert_eq!(parse_session_date("2025-03-01T10:30"), Some(datetime!(2025-03-01 10:30 UTC)));
        assert_eq!(parse_session_date("2025-03-01"), Some(datetime!(2025-03-01 0:00 UTC)));
        assert_eq!(parse_session_date("next tuesday"), None);
    }

    #[test]
    fn test_mirror_matches_original() {
        let owner = Uuid::new_v4();
        let original = session_at(datetime!(2025-03-01 10:00 UTC), SessionStatus::Pending);
        let mirror = original.mirror(owner);

        assert_ne!(mirror.id, original.id);
        assert!(mirror.mirrors(owner, &original));
        assert!(!mirror.mirrors(Uuid::new_v4(), &original));
    }

    #[test]
    fn test_check_update_rejects_leaving_terminal_state() {
        let s = session_at(datetime!(2025-03-01 10:00 UTC), SessionStatus::Completed);
        let update = SessionUpdate { status: Some(SessionStatus::Cancelled), notes: None };
        assert!(s.check_update(&update).is_err());

        let notes_only = SessionUpdate { status: None, notes: Some("great".into()) };
        assert!(s.check_update(&notes_only).is_ok());
    }

    #[test]
    fn test_stats() {
        let now = datetime!(2025-06-30 12:00 UTC);
        let sessions = vec![
            session_at(datetime!(2025-06-20 12:00 UTC), SessionStatus::Completed),
            session_at(datetime!(2025-06-25 12:00 UTC), SessionStatus::Pending),
            session_at(datetime!(2025-01-01 12:00 UTC), SessionStatus::Completed),
            session_at(datetime!(2025-07-10 12:00 UTC), SessionStatus::Cancelled),
        ];
        let stats = SessionStats::compute(&sessions, now);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.completion_rate, 67);
        assert_eq!(stats.recent_sessions, 2);
    }

    #[test]
    fn test_stats_all_cancelled_has_zero_rate() {
        let now = datetime!(2025-06-30 12:00 UTC);
        let sessions = vec![session_at(now, SessionStatus::Cancelled)];
        assert_eq!(SessionStats::compute(&sessions, now).completion_rate, 0);
        assert_eq!(SessionStats::compute(&[], now).completion_rate, 0);
    }

    #[test]
    fn test_upcoming_sorted_and_limited() {
        let now = datetime!(2025-06-30 12:00 UTC);
        let sessions = vec![
            session_at(datetime!(2025-07-09 12:00 UTC), SessionStatus::Confirmed),
            session_at(datetime!(2025-07-01 12:00 UTC), SessionStatus::Pending),
            session_at(datetime!(2025-07-02 12:00 UTC), SessionStatus::Cancelled),
            session_at(datetime!(2025-06-01 12:00 UTC), SessionStatus::Pending),
            session_at(datetime!(2025-07-05 12:00 UTC), SessionStatus::Pending),
        ];
        let next = upcoming(&sessions, now, 2);

        assert_eq!(next.len(), 2);
        assert_eq!(next[0].date, datetime!(2025-07-01 12:00 UTC));
        assert_eq!(next[1].date, datetime!(2025-07-05 12:00 UTC));
    }
}
