use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

/// A rating, stored only on the rated user's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub rater_id: Uuid,
    pub score: u8,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Rating {
    /// # Errors
    /// Returns `AppError::BadRequest` if `score` is outside 1..=5.
    pub fn new(rater_id: Uuid, score: i64, comment: Option<String>, now: OffsetDateTime) -> Result<Self> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(AppError::bad_request("Valid userId and score (1-5) are required"));
        }
        let score = u8::try_from(score).map_err(|_| AppError::Internal)?;
        Ok(Self { id: Uuid::new_v4(), rater_id, score, comment: comment.unwrap_or_default(), created_at: now })
    }
}

/// Mean score rounded to one decimal place; 0 for no ratings.
#[must_use]
pub fn average_score(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: f64 = ratings.iter().map(|r| f64::from(r.score)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}
