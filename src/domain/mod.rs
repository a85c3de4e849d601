pub mod auth;
pub mod matching;
pub mod message;
pub mod pagination;
pub mod rating;
pub mod session;
pub mod user;
