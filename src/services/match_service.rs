use crate::domain::matching::{self, MatchCandidate, SortKey};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::storage::UserStore;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_SUGGESTED_LIMIT: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: SortKey,
}

/// Match listing over the user store.
#[derive(Clone, Debug)]
pub struct MatchService {
    store: Arc<dyn UserStore>,
}

impl MatchService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    async fn requester(&self, user_id: Uuid) -> Result<User> {
        self.store.find_by_id(user_id).await?.ok_or_else(|| AppError::not_found("User"))
    }

    /// Scores every other user, then sorts and slices the requested page.
    #[tracing::instrument(err(level = "warn"), skip(self, query, page), fields(sort = ?query.sort))]
    pub async fn list(&self, user_id: Uuid, query: MatchQuery, page: PageRequest) -> Result<Page<MatchCandidate>> {
        let requester = self.requester(user_id).await?;
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let category = query.category.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let mut candidates: Vec<MatchCandidate> = self
            .store
            .list_except(user_id)
            .await?
            .into_iter()
            .filter(|u| search.is_none_or(|s| matching::matches_search(u, s)))
            .filter(|u| category.is_none_or(|c| matching::matches_category(u, c)))
            .map(|u| MatchCandidate::score(&requester, u))
            .collect();

        tracing::debug!(candidates = candidates.len(), "Scored match candidates");

        matching::sort_candidates(&mut candidates, query.sort);
        Ok(page.paginate(candidates))
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn suggested(&self, user_id: Uuid, limit: usize) -> Result<Vec<MatchCandidate>> {
        let requester = self.requester(user_id).await?;
        let pool = self.store.find_skill_overlap(user_id, &requester.offers, &requester.seeks).await?;
        Ok(matching::suggest(&requester, pool, limit))
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn get(&self, user_id: Uuid, match_id: Uuid) -> Result<MatchCandidate> {
        let candidate = self.store.find_by_id(match_id).await?.ok_or_else(|| AppError::not_found("User"))?;
        let requester = self.requester(user_id).await?;
        Ok(MatchCandidate::score(&requester, candidate))
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>> {
        self.store.all_skills().await
    }
}
