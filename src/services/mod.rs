pub mod account_service;
pub mod auth_service;
pub mod health_service;
pub mod match_service;
pub mod message_service;
pub mod rate_limit_service;
pub mod session_service;
pub mod user_service;
