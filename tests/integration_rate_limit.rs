use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::{Value, json};

mod common;

#[tokio::test]
async fn test_rate_limit_isolation() {
    let mut config = common::get_test_config();
    config.rate_limit.per_second = 1;
    config.rate_limit.burst = 2;
    let app = common::TestApp::spawn_with_config(config).await;

    let user_a = "1.1.1.1";
    let user_b = "2.2.2.2";

    for i in 1..=2 {
        let resp = app.client.get(app.url("/matches")).header("X-Forwarded-For", user_a).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "Request {i} for User A should reach the handler");
    }

    let resp = app.client.get(app.url("/matches")).header("X-Forwarded-For", user_a).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS, "User A should now be blocked");
    assert!(resp.headers().contains_key("retry-after") || resp.headers().contains_key("x-ratelimit-after"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": false, "message": "Too many requests, please try again later" }));

    let resp = app.client.get(app.url("/matches")).header("X-Forwarded-For", user_b).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "User B should be unaffected");
}

#[tokio::test]
async fn test_rate_limit_proxy_chain() {
    let mut config = common::get_test_config();
    config.rate_limit.per_second = 1;
    config.rate_limit.burst = 2;
    let app = common::TestApp::spawn_with_config(config).await;

    for _ in 0..2 {
        let resp =
            app.client.get(app.url("/matches")).header("X-Forwarded-For", "9.9.9.9, 1.1.1.1, 2.2.2.2").send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    let resp = app.client.get(app.url("/matches")).header("X-Forwarded-For", "different.spoof, 2.2.2.2").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS, "Should block based on the rightmost untrusted IP");
}

#[tokio::test]
async fn test_auth_tier_is_stricter() {
    let mut config = common::get_test_config();
    config.rate_limit.auth_per_second = 1;
    config.rate_limit.auth_burst = 1;
    let app = common::TestApp::spawn_with_config(config).await;

    let login = json!({ "email": "nobody@example.com", "password": "password123" });
    let resp = app.client.post(app.url("/auth/login")).header("X-Forwarded-For", "3.3.3.3").json(&login).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.client.post(app.url("/auth/login")).header("X-Forwarded-For", "3.3.3.3").json(&login).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // The standard tier keeps its own bucket.
    let resp = app.client.get(app.url("/matches")).header("X-Forwarded-For", "3.3.3.3").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_burst_is_capped() {
    let mut config = common::get_test_config();
    config.rate_limit.per_second = 1;
    config.rate_limit.burst = 3;
    let app = common::TestApp::spawn_with_config(config).await;

    let requests = (0..8).map(|_| app.client.get(app.url("/matches")).header("X-Forwarded-For", "4.4.4.4").send());
    let statuses: Vec<StatusCode> = join_all(requests).await.into_iter().map(|r| r.unwrap().status()).collect();

    let allowed = statuses.iter().filter(|s| **s == StatusCode::UNAUTHORIZED).count();
    let throttled = statuses.iter().filter(|s| **s == StatusCode::TOO_MANY_REQUESTS).count();
    assert!(allowed <= 4, "burst should cap admitted requests, got {allowed}");
    assert_eq!(allowed + throttled, 8);
}
