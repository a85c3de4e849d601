#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc, unreachable_pub)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use skillswap_server::AppBuilder;
use skillswap_server::api::{MgmtState, app_router, mgmt_router};
use skillswap_server::config::{
    AuthConfig, Config, DatabaseConfig, LogFormat, PaginationConfig, RateLimitConfig, ServerConfig, TelemetryConfig,
};
use std::net::SocketAddr;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("skillswap_server=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config() -> Config {
    Config {
        database: DatabaseConfig { url: None, max_connections: 5, acquire_timeout_secs: 5 },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            shutdown_timeout_secs: 1,
            trusted_proxies: vec!["127.0.0.1/32".parse().unwrap(), "::1/128".parse().unwrap()],
        },
        auth: AuthConfig { jwt_secret: "test_secret".to_string(), token_ttl_secs: 3600 },
        rate_limit: RateLimitConfig { per_second: 10_000, burst: 10_000, auth_per_second: 10_000, auth_burst: 10_000 },
        pagination: PaginationConfig { max_page_size: 100 },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

#[derive(Debug)]
pub struct TestApp {
    pub client: Client,
    pub server_url: String,
    pub mgmt_url: String,
    pub config: Config,
}

/// A registered account as seen by the tests.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        setup_tracing();

        let app = AppBuilder::new(config.clone()).build();
        let router = app_router(config.clone(), app.services);
        let mgmt = mgmt_router(MgmtState { health_service: app.health_service });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self {
            client: Client::new(),
            server_url: format!("http://{addr}/api"),
            mgmt_url: format!("http://{mgmt_addr}"),
            config,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    /// Registers a fresh account with the given skills.
    pub async fn register(&self, name: &str, offers: &[&str], seeks: &[&str]) -> TestUser {
        let run_id = &Uuid::new_v4().simple().to_string()[..8];
        let email = format!("{}_{run_id}@example.com", name.to_lowercase());

        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "email": email,
                "password": "password123",
                "name": name,
                "offers": offers,
                "seeks": seeks,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = resp.json().await.unwrap();
        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn get(&self, user: &TestUser, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).bearer_auth(&user.token).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    pub async fn post(&self, user: &TestUser, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self.client.post(self.url(path)).bearer_auth(&user.token).json(&body).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    pub async fn put(&self, user: &TestUser, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self.client.put(self.url(path)).bearer_auth(&user.token).json(&body).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    pub async fn delete(&self, user: &TestUser, path: &str) -> (StatusCode, Value) {
        let resp = self.client.delete(self.url(path)).bearer_auth(&user.token).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}
