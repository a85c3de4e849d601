use crate::domain::message::Message;
use crate::domain::rating::{Rating, average_score};
use crate::domain::session::{Session, SessionStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Weekdays,
    Weekends,
    Evenings,
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionLength {
    #[serde(rename = "30 minutes")]
    HalfHour,
    #[serde(rename = "1 hour")]
    OneHour,
    #[serde(rename = "1-2 hours")]
    OneToTwoHours,
    #[serde(rename = "2+ hours")]
    OverTwoHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Communication {
    #[serde(rename = "Video calls preferred")]
    VideoCalls,
    #[serde(rename = "In-person preferred")]
    InPerson,
    #[serde(rename = "Either works")]
    Either,
    #[serde(rename = "Text chat only")]
    TextOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeetingPreference {
    #[serde(rename = "Online only")]
    OnlineOnly,
    #[serde(rename = "Local meetups only")]
    LocalOnly,
    #[serde(rename = "Online or local meetups")]
    OnlineOrLocal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_length: Option<SessionLength>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communication: Option<Communication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<MeetingPreference>,
}

/// A user record. Sessions, ratings and messages live inside the record and are
/// persisted together with it.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub bio: Option<String>,
    pub offers: Vec<String>,
    pub seeks: Vec<String>,
    pub location: Location,
    pub preferences: Preferences,
    pub sessions: Vec<Session>,
    pub ratings: Vec<Rating>,
    pub messages: Vec<Message>,
    pub is_online: bool,
    pub last_active: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub bio: Option<String>,
    pub offers: Vec<String>,
    pub seeks: Vec<String>,
}

/// Partial profile edit; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<Location>,
    pub preferences: Option<Preferences>,
}

impl User {
    #[must_use]
    pub fn new(new_user: NewUser, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            bio: new_user.bio,
            offers: normalize_skills(new_user.offers),
            seeks: normalize_skills(new_user.seeks),
            location: Location::default(),
            preferences: Preferences::default(),
            sessions: Vec::new(),
            ratings: Vec::new(),
            messages: Vec::new(),
            is_online: false,
            last_active: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mean rating score rounded to one decimal, 0 when unrated.
    #[must_use]
    pub fn average_rating(&self) -> f64 {
        average_score(&self.ratings)
    }

    #[must_use]
    pub fn completed_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.status == SessionStatus::Completed).count()
    }

    #[must_use]
    pub fn has_rating_from(&self, rater_id: Uuid) -> bool {
        self.ratings.iter().any(|r| r.rater_id == rater_id)
    }

    pub fn apply_profile(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(bio) = update.bio {
            self.bio = Some(bio);
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(preferences) = update.preferences {
            self.preferences = preferences;
        }
    }

    pub fn set_skills(&mut self, offers: Option<Vec<String>>, seeks: Option<Vec<String>>) {
        if let Some(offers) = offers {
            self.offers = normalize_skills(offers);
        }
        if let Some(seeks) = seeks {
            self.seeks = normalize_skills(seeks);
        }
    }

    pub fn mark_active(&mut self, now: OffsetDateTime) {
        self.is_online = true;
        self.last_active = now;
    }

    pub fn mark_offline(&mut self, now: OffsetDateTime) {
        self.is_online = false;
        self.last_active = now;
    }
}

/// Trims skill names, drops blanks and removes case-insensitive duplicates,
/// keeping the first spelling seen.
#[must_use]
pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            NewUser {
                email: "a@example.com".into(),
                password_hash: "hash".into(),
                name: "Alice".into(),
                bio: None,
                offers: vec![" Guitar ".into(), "guitar".into(), String::new()],
                seeks: vec!["Spanish".into()],
            },
            OffsetDateTime::now_utc(),
        )
    }

    #[test]
    fn test_new_user_normalizes_skills() {
        let u = user();
        assert_eq!(u.offers, vec!["Guitar".to_string()]);
        assert_eq!(u.seeks, vec!["Spanish".to_string()]);
        assert!(!u.is_online);
    }

    #[test]
    fn test_profile_update_is_partial() {
        let mut u = user();
        u.apply_profile(ProfileUpdate { bio: Some("Teaches music".into()), ..ProfileUpdate::default() });
        assert_eq!(u.name, "Alice");
        assert_eq!(u.bio.as_deref(), Some("Teaches music"));
    }

    #[test]
    fn test_preferences_use_display_strings() {
        let prefs: Preferences = serde_json::from_value(serde_json::json!({
            "availability": "Evenings",
            "sessionLength": "1-2 hours",
            "communication": "Either works",
            "location": "Online only"
        }))
        .unwrap();
        assert_eq!(prefs.availability, Some(Availability::Evenings));
        assert_eq!(prefs.session_length, Some(SessionLength::OneToTwoHours));
        assert_eq!(prefs.location, Some(MeetingPreference::OnlineOnly));
    }
}
