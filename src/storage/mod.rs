use crate::config::DatabaseConfig;
use crate::domain::user::{NewUser, User};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use uuid::Uuid;

pub mod memory;
pub mod records;
pub mod user_repo;

pub use memory::InMemoryUserStore;
pub use user_repo::PgUserStore;

pub type DbPool = Pool<Postgres>;

/// Initializes the database connection pool.
///
/// # Errors
/// Returns `sqlx::Error` if the connection fails.
pub async fn init_pool(config: &DatabaseConfig, url: &str) -> std::result::Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(url)
        .await
}

/// The user record store. Each user document carries its own sessions,
/// ratings and messages and is written back whole by [`UserStore::save`].
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    async fn ping(&self) -> Result<()>;

    /// # Errors
    /// Returns `AppError::Conflict` if the email is already registered.
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Users for the given ids, in no particular order. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    /// Every user except `id`.
    async fn list_except(&self, id: Uuid) -> Result<Vec<User>>;

    /// Users other than `exclude` that offer one of `seeks` or seek one of
    /// `offers`, by exact skill name.
    async fn find_skill_overlap(&self, exclude: Uuid, offers: &[String], seeks: &[String]) -> Result<Vec<User>>;

    /// Distinct skill names across all offers and seeks, sorted.
    async fn all_skills(&self) -> Result<Vec<String>>;

    /// Writes the whole document and bumps `updated_at`.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the user no longer exists.
    async fn save(&self, user: &User) -> Result<()>;
}
