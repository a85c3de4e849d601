use crate::domain::user::{NewUser, User};
use crate::error::{AppError, Result};
use crate::storage::records::UserRecord;
use crate::storage::{DbPool, UserStore};
use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, name, bio, offers, seeks, location, preferences, \
                            sessions, ratings, messages, is_online, last_active, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, new_user))]
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let user = User::new(new_user, OffsetDateTime::now_utc());

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, bio, offers, seeks, last_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.bio)
        .bind(&user.offers)
        .bind(&user.seeks)
        .bind(user.last_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23505") => {
                Err(AppError::Conflict("User with this email already exists".into()))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let records = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_except(&self, id: Uuid) -> Result<Vec<User>> {
        let records =
            sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id <> $1 ORDER BY created_at"))
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(level = "debug", skip(self, offers, seeks))]
    async fn find_skill_overlap(&self, exclude: Uuid, offers: &[String], seeks: &[String]) -> Result<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id <> $1 AND (offers && $2 OR seeks && $3)"
        ))
        .bind(exclude)
        .bind(seeks)
        .bind(offers)
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn all_skills(&self) -> Result<Vec<String>> {
        let skills: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT skill FROM (
                SELECT unnest(offers) AS skill FROM users
                UNION
                SELECT unnest(seeks) AS skill FROM users
            ) s
            ORDER BY skill
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    #[tracing::instrument(level = "debug", skip(self, user), fields(user.id = %user.id))]
    async fn save(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, bio = $3, offers = $4, seeks = $5, location = $6, preferences = $7,
                sessions = $8, ratings = $9, messages = $10, is_online = $11, last_active = $12,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.bio)
        .bind(&user.offers)
        .bind(&user.seeks)
        .bind(Json(&user.location))
        .bind(Json(&user.preferences))
        .bind(Json(&user.sessions))
        .bind(Json(&user.ratings))
        .bind(Json(&user.messages))
        .bind(user.is_online)
        .bind(user.last_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }
}
