//! Skill-overlap compatibility and match-list filtering.
//!
//! Listing scores every candidate in memory before sorting and slicing the
//! page, so each request is O(n) in the number of users.

use crate::domain::user::User;
use crate::error::{AppError, Result};
use std::cmp::Ordering;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Suggested matches must score strictly above this.
pub const SUGGESTED_THRESHOLD: u8 = 20;

/// Case-insensitive containment in either direction.
#[must_use]
pub fn skills_overlap(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

fn count_overlapping(candidates: &[String], against: &[String]) -> usize {
    candidates.iter().filter(|skill| against.iter().any(|other| skills_overlap(skill, other))).count()
}

/// Score of candidate `(offers_b, seeks_b)` relative to requester `(offers_a, seeks_a)`,
/// in `0..=100`. A candidate with no skills scores 0.
#[must_use]
pub fn compatibility_score(offers_a: &[String], seeks_a: &[String], offers_b: &[String], seeks_b: &[String]) -> u8 {
    let denominator = offers_b.len() + seeks_b.len();
    if denominator == 0 {
        return 0;
    }
    let matched = count_overlapping(offers_b, seeks_a) + count_overlapping(seeks_b, offers_a);
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = ((matched as f64 / denominator as f64) * 100.0).round() as u8;
    score
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Rating,
    Compatibility,
    Sessions,
    Name,
    Newest,
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rating" => Ok(Self::Rating),
            "compatibility" => Ok(Self::Compatibility),
            "sessions" => Ok(Self::Sessions),
            "name" => Ok(Self::Name),
            "newest" => Ok(Self::Newest),
            other => Err(AppError::BadRequest(format!(
                "Unknown sortBy '{other}' (expected rating, compatibility, sessions, name or newest)"
            ))),
        }
    }
}

/// A scored candidate user.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub user: User,
    pub compatibility: u8,
    pub average_rating: f64,
    pub completed_sessions: usize,
}

impl MatchCandidate {
    #[must_use]
    pub fn score(requester: &User, candidate: User) -> Self {
        let compatibility = compatibility_score(&requester.offers, &requester.seeks, &candidate.offers, &candidate.seeks);
        let average_rating = candidate.average_rating();
        let completed_sessions = candidate.completed_sessions();
        Self { user: candidate, compatibility, average_rating, completed_sessions }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    #[must_use]
    pub fn created_at(&self) -> OffsetDateTime {
        self.user.created_at
    }
}

/// Case-insensitive match against name, offers or seeks.
#[must_use]
pub fn matches_search(user: &User, search: &str) -> bool {
    let needle = search.to_lowercase();
    user.name.to_lowercase().contains(&needle)
        || user.offers.iter().chain(&user.seeks).any(|skill| skill.to_lowercase().contains(&needle))
}

/// Case-insensitive membership in the user's offers. `All` matches everyone.
#[must_use]
pub fn matches_category(user: &User, category: &str) -> bool {
    if category.eq_ignore_ascii_case("all") {
        return true;
    }
    let needle = category.to_lowercase();
    user.offers.iter().any(|skill| skill.to_lowercase().contains(&needle))
}

/// Stable sort: descending for numeric keys and `newest`, ascending for `name`.
pub fn sort_candidates(candidates: &mut [MatchCandidate], key: SortKey) {
    let cmp: fn(&MatchCandidate, &MatchCandidate) -> Ordering = match key {
        SortKey::Rating => |a, b| b.average_rating.total_cmp(&a.average_rating),
        SortKey::Compatibility => |a, b| b.compatibility.cmp(&a.compatibility),
        SortKey::Sessions => |a, b| b.completed_sessions.cmp(&a.completed_sessions),
        SortKey::Name => |a, b| a.user.name.to_lowercase().cmp(&b.user.name.to_lowercase()),
        SortKey::Newest => |a, b| b.created_at().cmp(&a.created_at()),
    };
    candidates.sort_by(cmp);
}

/// Candidates above [`SUGGESTED_THRESHOLD`], best first, at most `limit`.
#[must_use]
pub fn suggest(requester: &User, pool: Vec<User>, limit: usize) -> Vec<MatchCandidate> {
    let mut scored: Vec<MatchCandidate> = pool
        .into_iter()
        .filter(|u| u.id != requester.id)
        .map(|u| MatchCandidate::score(requester, u))
        .filter(|c| c.compatibility > SUGGESTED_THRESHOLD)
        .collect();
    sort_candidates(&mut scored, SortKey::Compatibility);
    scored.truncate(limit);
    scored
}
