use crate::domain::pagination::{Page, PageRequest};
use crate::domain::session::{self, Session, SessionStats, SessionStatus, SessionUpdate};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::storage::UserStore;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

#[derive(Clone, Debug)]
struct Metrics {
    sessions_created_total: Counter<u64>,
    sessions_updated_total: Counter<u64>,
    mirror_misses_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("skillswap-server");
        Self {
            sessions_created_total: meter
                .u64_counter("skillswap_sessions_created_total")
                .with_description("Total number of sessions scheduled")
                .build(),
            sessions_updated_total: meter
                .u64_counter("skillswap_sessions_updated_total")
                .with_description("Session updates by resulting status")
                .build(),
            mirror_misses_total: meter
                .u64_counter("skillswap_session_mirror_misses_total")
                .with_description("Counterpart session copies that could not be located")
                .build(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRequest {
    pub with_user_id: Option<Uuid>,
    pub date: Option<String>,
    pub skill: Option<String>,
    pub notes: Option<String>,
}

/// A session together with the counterpart's record, when it still exists.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session: Session,
    pub partner: Option<User>,
}

/// Scheduling across both participants' records. Every write touches the
/// requester first and the counterpart second, with no rollback between them.
#[derive(Clone, Debug)]
pub struct SessionService {
    store: Arc<dyn UserStore>,
    metrics: Metrics,
}

impl SessionService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store, metrics: Metrics::new() }
    }

    async fn load(&self, user_id: Uuid) -> Result<User> {
        self.store.find_by_id(user_id).await?.ok_or_else(|| AppError::not_found("User"))
    }

    async fn with_partners(&self, sessions: Vec<Session>) -> Result<Vec<SessionView>> {
        let mut ids: Vec<Uuid> = sessions.iter().map(|s| s.partner_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let partners: HashMap<Uuid, User> =
            self.store.find_by_ids(&ids).await?.into_iter().map(|u| (u.id, u)).collect();

        Ok(sessions
            .into_iter()
            .map(|session| {
                let partner = partners.get(&session.partner_id).cloned();
                SessionView { session, partner }
            })
            .collect())
    }

    #[tracing::instrument(err(level = "warn"), skip(self, page))]
    pub async fn list(
        &self,
        user_id: Uuid,
        status: Option<SessionStatus>,
        page: PageRequest,
    ) -> Result<Page<SessionView>> {
        let user = self.load(user_id).await?;
        let mut sessions: Vec<Session> =
            user.sessions.into_iter().filter(|s| status.is_none_or(|st| s.status == st)).collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date));

        let page = page.paginate(sessions);
        let views = self.with_partners(page.items).await?;
        Ok(Page { items: views, pagination: page.pagination })
    }

    /// Writes a pending session to the requester and a mirror to the counterpart.
    #[tracing::instrument(err(level = "warn"), skip(self, request))]
    pub async fn create(&self, user_id: Uuid, request: SessionRequest) -> Result<SessionView> {
        let skill = request.skill.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let date = request.date.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let (Some(partner_id), Some(date), Some(skill)) = (request.with_user_id, date, skill) else {
            return Err(AppError::bad_request("withUserId, date, and skill are required"));
        };
        let date = session::parse_session_date(date).ok_or_else(|| AppError::bad_request("Invalid session date"))?;

        let mut partner =
            self.store.find_by_id(partner_id).await?.ok_or_else(|| AppError::not_found("Target user"))?;
        if partner_id == user_id {
            return Err(AppError::bad_request("Cannot create session with yourself"));
        }
        let mut requester = self.load(user_id).await?;

        let now = OffsetDateTime::now_utc();
        let notes = request.notes.unwrap_or_default();
        let created = Session::new(partner_id, date, skill.to_string(), notes, now);
        let mirror = created.mirror(user_id);

        requester.sessions.push(created.clone());
        self.store.save(&requester).await?;

        partner.sessions.push(mirror);
        self.store.save(&partner).await?;

        tracing::info!(session.id = %created.id, partner_id = %partner_id, "Session scheduled");
        self.metrics.sessions_created_total.add(1, &[]);

        Ok(SessionView { session: created, partner: Some(partner) })
    }

    /// Applies a status/notes change to the requester's copy and, when it can be
    /// found, to the counterpart's mirror.
    #[tracing::instrument(err(level = "warn"), skip(self, update))]
    pub async fn update(&self, user_id: Uuid, session_id: Uuid, update: SessionUpdate) -> Result<Session> {
        if update.status.is_none() && update.notes.is_none() {
            return Err(AppError::bad_request("Nothing to update: provide status or notes"));
        }

        let mut requester = self.load(user_id).await?;
        let Some(owned) = requester.sessions.iter_mut().find(|s| s.id == session_id) else {
            return Err(AppError::not_found("Session"));
        };
        owned.check_update(&update)?;

        let original = owned.clone();
        let now = OffsetDateTime::now_utc();
        owned.apply(&update, now);
        let updated = owned.clone();
        self.store.save(&requester).await?;

        self.sync_mirror(user_id, &original, |mirror| mirror.apply(&update, now)).await?;

        self.metrics.sessions_updated_total.add(1, &[KeyValue::new("status", updated.status.as_str())]);
        Ok(updated)
    }

    /// Removes the session from the requester, then every matching mirror from
    /// the counterpart.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn delete(&self, user_id: Uuid, session_id: Uuid) -> Result<()> {
        let mut requester = self.load(user_id).await?;
        let Some(index) = requester.sessions.iter().position(|s| s.id == session_id) else {
            return Err(AppError::not_found("Session"));
        };
        let removed = requester.sessions.remove(index);
        self.store.save(&requester).await?;

        let Some(mut partner) = self.store.find_by_id(removed.partner_id).await? else {
            tracing::warn!(partner_id = %removed.partner_id, "Counterpart no longer exists");
            self.metrics.mirror_misses_total.add(1, &[]);
            return Ok(());
        };
        let before = partner.sessions.len();
        partner.sessions.retain(|s| !s.mirrors(user_id, &removed));
        if partner.sessions.len() == before {
            tracing::warn!(partner_id = %removed.partner_id, "Mirror session not found, leaving counterpart untouched");
            self.metrics.mirror_misses_total.add(1, &[]);
            return Ok(());
        }
        self.store.save(&partner).await
    }

    async fn sync_mirror(&self, user_id: Uuid, original: &Session, apply: impl Fn(&mut Session)) -> Result<()> {
        let Some(mut partner) = self.store.find_by_id(original.partner_id).await? else {
            tracing::warn!(partner_id = %original.partner_id, "Counterpart no longer exists");
            self.metrics.mirror_misses_total.add(1, &[]);
            return Ok(());
        };
        let Some(mirror) = partner.sessions.iter_mut().find(|s| s.mirrors(user_id, original)) else {
            tracing::warn!(partner_id = %original.partner_id, "Mirror session not found, counterpart is out of sync");
            self.metrics.mirror_misses_total.add(1, &[]);
            return Ok(());
        };
        apply(mirror);
        self.store.save(&partner).await
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn stats(&self, user_id: Uuid) -> Result<SessionStats> {
        let user = self.load(user_id).await?;
        Ok(SessionStats::compute(&user.sessions, OffsetDateTime::now_utc()))
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn upcoming(&self, user_id: Uuid, limit: usize) -> Result<Vec<SessionView>> {
        let user = self.load(user_id).await?;
        let sessions = session::upcoming(&user.sessions, OffsetDateTime::now_utc(), limit);
        self.with_partners(sessions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::NewUser;
    use crate::storage::InMemoryUserStore;

    async fn seed(store: &InMemoryUserStore, email: &str) -> User {
        store
            .create_user(NewUser {
                email: email.into(),
                password_hash: String::new(),
                name: email.into(),
                bio: None,
                offers: vec![],
                seeks: vec![],
            })
            .await
            .unwrap()
    }

    fn request(with: Uuid) -> SessionRequest {
        SessionRequest {
            with_user_id: Some(with),
            date: Some("2030-05-01T14:30".into()),
            skill: Some("Guitar".into()),
            notes: None,
        }
    }

    async fn setup() -> (Arc<InMemoryUserStore>, SessionService, User, User) {
        let store = Arc::new(InMemoryUserStore::new());
        let a = seed(&store, "a@example.com").await;
        let b = seed(&store, "b@example.com").await;
        let service = SessionService::new(Arc::clone(&store) as Arc<dyn UserStore>);
        (store, service, a, b)
    }

    #[tokio::test]
    async fn test_create_writes_both_sides() {
        let (store, service, a, b) = setup().await;
        let created = service.create(a.id, request(b.id)).await.unwrap();

        let a = store.find_by_id(a.id).await.unwrap().unwrap();
        let b = store.find_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(a.sessions.len(), 1);
        assert_eq!(b.sessions.len(), 1);
        assert_eq!(b.sessions[0].status, SessionStatus::Pending);
        assert_eq!(b.sessions[0].partner_id, a.id);
        assert_eq!(b.sessions[0].date, created.session.date);
        assert_ne!(b.sessions[0].id, created.session.id);
    }

    #[tokio::test]
    async fn test_create_validation_order() {
        let (_store, service, a, _b) = setup().await;
        let missing = SessionRequest { skill: None, ..request(Uuid::new_v4()) };
        assert!(matches!(service.create(a.id, missing).await, Err(AppError::BadRequest(_))));
        assert!(matches!(service.create(a.id, request(Uuid::new_v4())).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.create(a.id, request(a.id)).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_propagates_to_mirror() {
        let (store, service, a, b) = setup().await;
        let created = service.create(a.id, request(b.id)).await.unwrap();

        let update = SessionUpdate { status: Some(SessionStatus::Confirmed), notes: Some("bring tabs".into()) };
        service.update(a.id, created.session.id, update).await.unwrap();

        let b = store.find_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(b.sessions[0].status, SessionStatus::Confirmed);
        assert_eq!(b.sessions[0].notes, "bring tabs");
    }

    #[tokio::test]
    async fn test_update_rejects_illegal_transition() {
        let (_store, service, a, b) = setup().await;
        let created = service.create(a.id, request(b.id)).await.unwrap();
        let update = SessionUpdate { status: Some(SessionStatus::Completed), notes: None };
        assert!(matches!(service.update(a.id, created.session.id, update).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_mirror() {
        let (store, service, a, b) = setup().await;
        let created = service.create(a.id, request(b.id)).await.unwrap();
        service.delete(a.id, created.session.id).await.unwrap();

        assert!(store.find_by_id(a.id).await.unwrap().unwrap().sessions.is_empty());
        assert!(store.find_by_id(b.id).await.unwrap().unwrap().sessions.is_empty());
    }

    #[tokio::test]
    async fn test_delete_leaves_orphan_when_mirror_diverged() {
        let (store, service, a, b) = setup().await;
        let created = service.create(a.id, request(b.id)).await.unwrap();

        let mut b_doc = store.find_by_id(b.id).await.unwrap().unwrap();
        b_doc.sessions[0].skill = "Guitar (advanced)".into();
        store.save(&b_doc).await.unwrap();

        service.delete(a.id, created.session.id).await.unwrap();
        assert!(store.find_by_id(a.id).await.unwrap().unwrap().sessions.is_empty());
        assert_eq!(store.find_by_id(b.id).await.unwrap().unwrap().sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_update_succeeds_when_mirror_diverged() {
        let (store, service, a, b) = setup().await;
        let created = service.create(a.id, request(b.id)).await.unwrap();

        let mut b_doc = store.find_by_id(b.id).await.unwrap().unwrap();
        b_doc.sessions[0].date += time::Duration::hours(1);
        store.save(&b_doc).await.unwrap();

        let update = SessionUpdate { status: Some(SessionStatus::Confirmed), notes: Some("still on".into()) };
        let updated = service.update(a.id, created.session.id, update).await.unwrap();
        assert_eq!(updated.status, SessionStatus::Confirmed);

        let b_doc = store.find_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(b_doc.sessions[0].status, SessionStatus::Pending);
        assert!(b_doc.sessions[0].notes.is_empty());
    }

    #[tokio::test]
    async fn test_stats_and_upcoming() {
        let (_store, service, a, b) = setup().await;
        service.create(a.id, request(b.id)).await.unwrap();

        let stats = service.stats(a.id).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.pending, 1);

        let upcoming = service.upcoming(a.id, DEFAULT_UPCOMING_LIMIT).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].partner.as_ref().map(|p| p.id), Some(b.id));
    }
}
