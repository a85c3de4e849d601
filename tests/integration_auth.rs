use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::StatusCode;
use serde_json::{Value, json};

mod common;

#[tokio::test]
async fn test_register_login_verify_logout() {
    let app = common::TestApp::spawn().await;
    let user = app.register("Alice", &["Guitar"], &["Spanish"]).await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": user.email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["offers"], json!(["Guitar"]));
    assert!(body["user"].get("passwordHash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let resp = app.client.get(app.url("/auth/verify")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["id"], user.id.as_str());
    assert_eq!(body["user"]["isOnline"], true);

    let (status, _) = app.post(&user, "/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get(&user, "/users/profile").await;
    assert_eq!(body["user"]["isOnline"], false);
}

#[tokio::test]
async fn test_register_validation() {
    let app = common::TestApp::spawn().await;
    let existing = app.register("Bob", &[], &[]).await;

    let cases = [
        (json!({ "email": "x@example.com", "password": "password123" }), "Email, password, and name are required"),
        (json!({ "email": "not-an-email", "password": "password123", "name": "X" }), "Please enter a valid email"),
        (json!({ "email": "y@example.com", "password": "short", "name": "Y" }), "Password must be at least 8 characters long"),
        (
            json!({ "email": existing.email.to_uppercase(), "password": "password123", "name": "Dup" }),
            "User with this email already exists",
        ),
    ];

    for (payload, message) in cases {
        let resp = app.client.post(app.url("/auth/register")).json(&payload).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload: {payload}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = common::TestApp::spawn().await;
    let user = app.register("Carol", &[], &[]).await;

    for (email, password) in [(user.email.as_str(), "wrong-password"), ("nobody@example.com", "password123")] {
        let resp = app
            .client
            .post(app.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_token_required_and_checked() {
    let app = common::TestApp::spawn().await;
    let user = app.register("Dan", &[], &[]).await;

    let resp = app.client.get(app.url("/users/profile")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Access token required");

    let resp = app.client.get(app.url("/users/profile")).bearer_auth("garbage").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Swap in another subject while keeping the original signature.
    let parts: Vec<&str> = user.token.split('.').collect();
    let claims = json!({ "sub": uuid::Uuid::new_v4(), "exp": 4_102_444_800_u64, "iat": 0 });
    let forged = format!("{}.{}.{}", parts[0], URL_SAFE_NO_PAD.encode(claims.to_string()), parts[2]);
    let resp = app.client.get(app.url("/users/profile")).bearer_auth(forged).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or expired token");
}
