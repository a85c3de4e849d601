use crate::domain::user::{NewUser, User};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use crate::storage::UserStore;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone, Debug)]
struct Metrics {
    users_registered_total: Counter<u64>,
    logins_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("skillswap-server");
        Self {
            users_registered_total: meter
                .u64_counter("skillswap_users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
            logins_total: meter
                .u64_counter("skillswap_logins_total")
                .with_description("Login attempts by outcome")
                .build(),
        }
    }
}

#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub bio: Option<String>,
    pub offers: Vec<String>,
    pub seeks: Vec<String>,
}

/// A freshly authenticated user and their bearer token.
#[derive(Debug)]
pub struct AuthOutcome {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Debug)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    auth_service: AuthService,
    metrics: Metrics,
}

impl AccountService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, auth_service: AuthService) -> Self {
        Self { store, auth_service, metrics: Metrics::new() }
    }

    #[tracing::instrument(
        skip(self, registration),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn register(&self, registration: Registration) -> Result<AuthOutcome> {
        let email = normalize_email(&registration.email);
        let name = registration.name.trim().to_string();
        if email.is_empty() || registration.password.is_empty() || name.is_empty() {
            return Err(AppError::bad_request("Email, password, and name are required"));
        }
        if !is_valid_email(&email) {
            return Err(AppError::bad_request("Please enter a valid email"));
        }
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            tracing::warn!("Registration rejected: password too short");
            return Err(AppError::BadRequest(format!("Password must be at least {MIN_PASSWORD_LEN} characters long")));
        }

        let password_hash = self.auth_service.hash_password(&registration.password).await?;
        let user = self
            .store
            .create_user(NewUser {
                email,
                password_hash,
                name,
                bio: registration.bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()),
                offers: registration.offers,
                seeks: registration.seeks,
            })
            .await?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        let token = self.auth_service.issue_token(user.id)?;

        tracing::info!("User registered successfully");
        self.metrics.users_registered_total.add(1, &[]);

        Ok(AuthOutcome { token, user })
    }

    #[tracing::instrument(
        skip(self, email, password),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::bad_request("Email and password are required"));
        }

        let Some(mut user) = self.store.find_by_email(&email).await? else {
            tracing::warn!("Login failed: user not found");
            self.metrics.logins_total.add(1, &[KeyValue::new("status", "failed")]);
            return Err(AppError::InvalidCredentials);
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        if !self.auth_service.verify_password(password, &user.password_hash).await? {
            tracing::warn!("Login failed: invalid password");
            self.metrics.logins_total.add(1, &[KeyValue::new("status", "failed")]);
            return Err(AppError::InvalidCredentials);
        }

        user.mark_active(OffsetDateTime::now_utc());
        self.store.save(&user).await?;

        let token = self.auth_service.issue_token(user.id)?;

        tracing::info!("User logged in successfully");
        self.metrics.logins_total.add(1, &[KeyValue::new("status", "success")]);

        Ok(AuthOutcome { token, user })
    }

    /// Returns the user behind an already validated token.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn verify(&self, user_id: Uuid) -> Result<User> {
        self.store.find_by_id(user_id).await?.ok_or_else(|| AppError::not_found("User"))
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn logout(&self, user_id: Uuid) -> Result<()> {
        let mut user = self.store.find_by_id(user_id).await?.ok_or_else(|| AppError::not_found("User"))?;
        user.mark_offline(OffsetDateTime::now_utc());
        self.store.save(&user).await?;
        tracing::info!("User logged out");
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
        && !email.chars().any(char::is_whitespace)
}
