//! Wire types. Every response is wrapped in [`Envelope`], which puts
//! `success` (and an optional `message`) next to the flattened payload.

use serde::Serialize;

pub mod auth;
pub mod health;
pub mod matches;
pub mod messaging;
pub mod sessions;
pub mod users;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Envelope<T> {
    pub const fn ok(data: T) -> Self {
        Self { success: true, message: None, data }
    }

    pub const fn with_message(message: &'static str, data: T) -> Self {
        Self { success: true, message: Some(message), data }
    }
}

/// Payload for responses that only carry `success`/`message`.
#[derive(Debug, Serialize)]
pub struct Empty {}

/// `page`/`limit` query parameters shared by paginated endpoints.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
