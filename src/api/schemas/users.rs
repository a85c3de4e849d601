use crate::domain::rating::Rating;
use crate::domain::user::{Location, Preferences, ProfileUpdate, User};
use crate::services::user_service::UserStats;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The `{id, name, email}` triple attached to sessions and conversations.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self { id: user.id, name: user.name.clone(), email: user.email.clone() }
    }
}

/// The requester's own profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub offers: Vec<String>,
    pub seeks: Vec<String>,
    pub location: Location,
    pub preferences: Preferences,
    pub average_rating: f64,
    pub completed_sessions: usize,
    pub is_online: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub last_active: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            average_rating: user.average_rating(),
            completed_sessions: user.completed_sessions(),
            id: user.id,
            email: user.email,
            name: user.name,
            bio: user.bio,
            offers: user.offers,
            seeks: user.seeks,
            location: user.location,
            preferences: user.preferences,
            is_online: user.is_online,
            last_active: user.last_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub id: Uuid,
    pub from: Uuid,
    pub score: u8,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Rating> for RatingView {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            from: rating.rater_id,
            score: rating.score,
            comment: rating.comment,
            created_at: rating.created_at,
        }
    }
}

/// Another user's profile as anyone may see it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub offers: Vec<String>,
    pub seeks: Vec<String>,
    pub location: Location,
    pub average_rating: f64,
    pub completed_sessions: usize,
    pub ratings: Vec<RatingView>,
    pub is_online: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            average_rating: user.average_rating(),
            completed_sessions: user.completed_sessions(),
            id: user.id,
            email: user.email,
            name: user.name,
            bio: user.bio,
            offers: user.offers,
            seeks: user.seeks,
            location: user.location,
            ratings: user.ratings.into_iter().map(Into::into).collect(),
            is_online: user.is_online,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse<T> {
    pub user: T,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<Location>,
    pub preferences: Option<Preferences>,
}

impl From<UpdateProfile> for ProfileUpdate {
    fn from(body: UpdateProfile) -> Self {
        Self { name: body.name, bio: body.bio, location: body.location, preferences: body.preferences }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSkills {
    pub offers: Option<Vec<String>>,
    pub seeks: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateUser {
    pub user_id: Option<Uuid>,
    pub score: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub rating: RatingView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub skills_offered: usize,
    pub skills_seeking: usize,
    pub sessions_completed: usize,
    pub average_rating: f64,
    pub total_ratings: usize,
}

impl From<UserStats> for StatsView {
    fn from(stats: UserStats) -> Self {
        Self {
            skills_offered: stats.skills_offered,
            skills_seeking: stats.skills_seeking,
            sessions_completed: stats.sessions_completed,
            average_rating: stats.average_rating,
            total_ratings: stats.total_ratings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: StatsView,
}
