use crate::api::schemas::users::RatingView;
use crate::domain::matching::MatchCandidate;
use crate::domain::pagination::Pagination;
use crate::domain::user::Location;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub offers: Vec<String>,
    pub seeks: Vec<String>,
    pub location: Location,
    pub average_rating: f64,
    pub completed_sessions: usize,
    pub compatibility_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<RatingView>>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl MatchView {
    /// Single-match view, which also carries the candidate's ratings.
    #[must_use]
    pub fn detailed(candidate: MatchCandidate) -> Self {
        let ratings = candidate.user.ratings.clone().into_iter().map(Into::into).collect();
        Self { ratings: Some(ratings), ..Self::from(candidate) }
    }
}

impl From<MatchCandidate> for MatchView {
    fn from(candidate: MatchCandidate) -> Self {
        let user = candidate.user;
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            offers: user.offers,
            seeks: user.seeks,
            location: user.location,
            average_rating: candidate.average_rating,
            completed_sessions: candidate.completed_sessions,
            compatibility_score: candidate.compatibility,
            ratings: None,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchList {
    pub matches: Vec<MatchView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    #[serde(rename = "match")]
    pub candidate: MatchView,
}

#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
}
