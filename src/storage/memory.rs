use crate::domain::user::{NewUser, User};
use crate::error::{AppError, Result};
use crate::storage::UserStore;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::BTreeSet;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// Process-local user store used when no database is configured.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUserStore {
    users: Arc<DashMap<Uuid, User>>,
    emails: Arc<DashMap<String, Uuid>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(&self, mut keep: impl FnMut(&User) -> bool) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().filter(|e| keep(e.value())).map(|e| e.value().clone()).collect();
        users.sort_by_key(|u| u.created_at);
        users
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let user = User::new(new_user, OffsetDateTime::now_utc());
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("User with this email already exists".into())),
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.emails.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        Ok(ids.iter().filter_map(|id| self.users.get(id).map(|u| u.value().clone())).collect())
    }

    async fn list_except(&self, id: Uuid) -> Result<Vec<User>> {
        Ok(self.collect(|u| u.id != id))
    }

    async fn find_skill_overlap(&self, exclude: Uuid, offers: &[String], seeks: &[String]) -> Result<Vec<User>> {
        Ok(self.collect(|u| {
            u.id != exclude
                && (u.offers.iter().any(|s| seeks.contains(s)) || u.seeks.iter().any(|s| offers.contains(s)))
        }))
    }

    async fn all_skills(&self) -> Result<Vec<String>> {
        let mut skills = BTreeSet::new();
        for entry in self.users.iter() {
            skills.extend(entry.offers.iter().cloned());
            skills.extend(entry.seeks.iter().cloned());
        }
        Ok(skills.into_iter().collect())
    }

    async fn save(&self, user: &User) -> Result<()> {
        let Some(mut stored) = self.users.get_mut(&user.id) else {
            return Err(AppError::not_found("User"));
        };
        let mut updated = user.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        *stored = updated;
        Ok(())
    }
}
