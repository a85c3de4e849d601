use crate::api::schemas::users::UserProfile;
use crate::services::account_service::{AuthOutcome, Registration};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Register {
    pub email: String,
    pub password: String,
    pub name: String,
    pub bio: Option<String>,
    pub offers: Vec<String>,
    pub seeks: Vec<String>,
}

impl From<Register> for Registration {
    fn from(body: Register) -> Self {
        Self {
            email: body.email,
            password: body.password,
            name: body.name,
            bio: body.bio,
            offers: body.offers,
            seeks: body.seeks,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        Self { token: outcome.token, user: outcome.user.into() }
    }
}
