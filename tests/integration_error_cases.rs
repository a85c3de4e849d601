use reqwest::StatusCode;
use serde_json::{Value, json};

mod common;

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let app = common::TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_invalid_path_identifier() {
    let app = common::TestApp::spawn().await;
    let user = app.register("Kai", &[], &[]).await;

    let (status, body) = app.get(&user, "/users/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "Invalid identifier" }));
}

#[tokio::test]
async fn test_unknown_resources_are_not_found() {
    let app = common::TestApp::spawn().await;
    let user = app.register("Lea", &[], &[]).await;
    let missing = uuid::Uuid::new_v4();

    let (status, body) = app.put(&user, &format!("/sessions/{missing}"), json!({ "status": "confirmed" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");

    let (status, body) = app.put(&user, &format!("/messages/read/{missing}"), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Message not found");

    let (status, body) = app.put(&user, &format!("/sessions/{missing}"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Nothing to update: provide status or notes");
}

#[tokio::test]
async fn test_token_for_deleted_account_is_not_found() {
    let app = common::TestApp::spawn().await;
    let ghost = common::TestUser {
        id: uuid::Uuid::new_v4().to_string(),
        email: "ghost@example.com".to_string(),
        token: skillswap_server::services::auth_service::AuthService::new(app.config.auth.clone())
            .issue_token(uuid::Uuid::new_v4())
            .unwrap(),
    };

    let (status, body) = app.get(&ghost, "/users/profile").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}
