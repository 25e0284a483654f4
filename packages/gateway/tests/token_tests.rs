//! Email confirmation and password reset under `/users/:0/tokens`.

mod common;

use axum::http::StatusCode;
use common::{confirmed_user, envelope, unconfirmed_user, TestHarness, TestRequest, PASSWORD};
use gateway_core::kernel::TokenPurpose;
use serde_json::json;
use test_context::test_context;

async fn register(ctx: &TestHarness, username: &str) -> String {
    let response = ctx
        .send(
            TestRequest::post("/users")
                .json(envelope(json!({
                    "username": username,
                    "password": PASSWORD,
                    "accepted_terms": true,
                })))
                .build(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    response.body["data"]["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Email confirmation
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_registration_token_confirms_email(ctx: &TestHarness) {
    let id = register(ctx, "confirm@example.com").await;
    let token = ctx
        .mailer
        .last_token("confirm@example.com", TokenPurpose::EmailConfirmation)
        .expect("registration mails a confirmation token");

    // Unconfirmed accounts cannot use the API yet
    let before = ctx
        .send(
            TestRequest::get(&format!("/users/{id}"))
                .basic("confirm@example.com", PASSWORD)
                .build(),
        )
        .await;
    assert_eq!(before.status, StatusCode::UNAUTHORIZED);

    let confirmed = ctx
        .send(
            TestRequest::post(&format!("/users/{id}/tokens"))
                .basic("confirm@example.com", PASSWORD)
                .json(envelope(json!({ "token": token })))
                .build(),
        )
        .await;
    assert_eq!(confirmed.status, StatusCode::OK);
    assert_eq!(confirmed.body["origin"], "validate_email");

    let after = ctx
        .send(
            TestRequest::get(&format!("/users/{id}"))
                .basic("confirm@example.com", PASSWORD)
                .build(),
        )
        .await;
    assert_eq!(after.status, StatusCode::OK);
    assert_eq!(after.body["data"]["email_confirmed"], true);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_empty_token_rejected(ctx: &TestHarness) {
    let id = register(ctx, "empty@example.com").await;

    let response = ctx
        .send(
            TestRequest::post(&format!("/users/{id}/tokens"))
                .basic("empty@example.com", PASSWORD)
                .json(envelope(json!({ "token": "" })))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "token is required");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_wrong_token_rejected(ctx: &TestHarness) {
    let id = register(ctx, "wrong@example.com").await;

    let response = ctx
        .send(
            TestRequest::post(&format!("/users/{id}/tokens"))
                .basic("wrong@example.com", PASSWORD)
                .json(envelope(json!({ "token": "0000" })))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "invalid token");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_cannot_confirm_for_another_user(ctx: &TestHarness) {
    let victim = register(ctx, "target@example.com").await;
    unconfirmed_user(&ctx.store, "meddler@example.com").await;
    let token = ctx
        .mailer
        .last_token("target@example.com", TokenPurpose::EmailConfirmation)
        .unwrap();

    let response = ctx
        .send(
            TestRequest::post(&format!("/users/{victim}/tokens"))
                .basic("meddler@example.com", PASSWORD)
                .json(envelope(json!({ "token": token })))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Password reset
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_reset_requires_confirmed_email(ctx: &TestHarness) {
    let user = unconfirmed_user(&ctx.store, "early@example.com").await;

    let response = ctx
        .send(TestRequest::get(&format!("/users/{}/tokens", user.id)).build())
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "email not confirmed");
    assert_eq!(ctx.mailer.count(), 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_reset_password_flow(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "forgot@example.com").await;
    let tokens = format!("/users/{}/tokens", user.id);

    let requested = ctx.send(TestRequest::get(&tokens).build()).await;
    assert_eq!(requested.status, StatusCode::OK);
    assert_eq!(requested.body["origin"], "reset_token");
    let token = ctx
        .mailer
        .last_token("forgot@example.com", TokenPurpose::PasswordReset)
        .unwrap();

    let reset = ctx
        .send(
            TestRequest::put(&tokens)
                .json(envelope(json!({ "token": token, "password": "brand new pw" })))
                .build(),
        )
        .await;
    assert_eq!(reset.status, StatusCode::OK);
    assert_eq!(reset.body["origin"], "reset_password");

    let old = ctx
        .send(
            TestRequest::get(&format!("/users/{}", user.id))
                .basic("forgot@example.com", PASSWORD)
                .build(),
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = ctx
        .send(
            TestRequest::get(&format!("/users/{}", user.id))
                .basic("forgot@example.com", "brand new pw")
                .build(),
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);

    // The token is single use
    let replay = ctx
        .send(
            TestRequest::put(&tokens)
                .json(envelope(json!({ "token": token, "password": "third pw" })))
                .build(),
        )
        .await;
    assert_eq!(replay.status, StatusCode::BAD_REQUEST);
    assert_eq!(replay.description(), "invalid token");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_reset_without_password_rejected(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "blank@example.com").await;
    let tokens = format!("/users/{}/tokens", user.id);
    ctx.send(TestRequest::get(&tokens).build()).await;
    let token = ctx
        .mailer
        .last_token("blank@example.com", TokenPurpose::PasswordReset)
        .unwrap();

    let response = ctx
        .send(
            TestRequest::put(&tokens)
                .json(envelope(json!({ "token": token })))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "password is required");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_reset_for_unknown_user(ctx: &TestHarness) {
    let response = ctx
        .send(TestRequest::get(&format!("/users/{}/tokens", uuid::Uuid::new_v4())).build())
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
