use crate::domain::rating::Rating;
use crate::domain::user::{ProfileUpdate, User};
use crate::error::{AppError, Result};
use crate::storage::UserStore;
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    ratings_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("skillswap-server");
        Self {
            ratings_total: meter
                .u64_counter("skillswap_ratings_total")
                .with_description("Total number of ratings submitted")
                .build(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserStats {
    pub skills_offered: usize,
    pub skills_seeking: usize,
    pub sessions_completed: usize,
    pub average_rating: f64,
    pub total_ratings: usize,
}

impl From<&User> for UserStats {
    fn from(user: &User) -> Self {
        Self {
            skills_offered: user.offers.len(),
            skills_seeking: user.seeks.len(),
            sessions_completed: user.completed_sessions(),
            average_rating: user.average_rating(),
            total_ratings: user.ratings.len(),
        }
    }
}

/// Profiles, skill lists and ratings.
#[derive(Clone, Debug)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    metrics: Metrics,
}

impl UserService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store, metrics: Metrics::new() }
    }

    async fn load(&self, user_id: Uuid) -> Result<User> {
        self.store.find_by_id(user_id).await?.ok_or_else(|| AppError::not_found("User"))
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn profile(&self, user_id: Uuid) -> Result<User> {
        self.load(user_id).await
    }

    #[tracing::instrument(err(level = "warn"), skip(self, update))]
    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::bad_request("Name cannot be empty"));
        }
        let mut user = self.load(user_id).await?;
        user.apply_profile(update);
        self.store.save(&user).await?;
        Ok(user)
    }

    #[tracing::instrument(err(level = "warn"), skip(self, offers, seeks))]
    pub async fn update_skills(
        &self,
        user_id: Uuid,
        offers: Option<Vec<String>>,
        seeks: Option<Vec<String>>,
    ) -> Result<User> {
        let mut user = self.load(user_id).await?;
        user.set_skills(offers, seeks);
        self.store.save(&user).await?;
        Ok(user)
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn public_profile(&self, user_id: Uuid) -> Result<User> {
        self.load(user_id).await
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn stats(&self, user_id: Uuid) -> Result<UserStats> {
        let user = self.load(user_id).await?;
        Ok(UserStats::from(&user))
    }

    /// Records `rater_id`'s rating on `ratee_id`. One rating per pair.
    #[tracing::instrument(err(level = "warn"), skip(self, comment))]
    pub async fn rate(&self, rater_id: Uuid, ratee_id: Uuid, score: i64, comment: Option<String>) -> Result<Rating> {
        let rating = Rating::new(rater_id, score, comment, OffsetDateTime::now_utc())?;
        if rater_id == ratee_id {
            return Err(AppError::bad_request("You cannot rate yourself"));
        }

        let mut ratee = self.load(ratee_id).await?;
        if ratee.has_rating_from(rater_id) {
            return Err(AppError::Conflict("You have already rated this user".into()));
        }

        ratee.ratings.push(rating.clone());
        self.store.save(&ratee).await?;

        self.metrics.ratings_total.add(1, &[]);
        Ok(rating)
    }
}
