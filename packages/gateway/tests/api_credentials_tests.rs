//! Integration tests for the basic-credential resource API.
//!
//! Covers registration, per-user authorization, super user access,
//! envelope freshness and the uniform unauthenticated response.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{
    confirmed_user, envelope, envelope_aged, super_user, unconfirmed_user, TestHarness,
    TestRequest, PASSWORD,
};
use gateway_core::kernel::BaseUserStore;
use serde_json::json;
use test_context::test_context;

fn registration(username: &str) -> serde_json::Value {
    json!({
        "username": username,
        "password": PASSWORD,
        "accepted_terms": true,
    })
}

// ============================================================================
// Registration
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_register_returns_id_and_modification_time(ctx: &TestHarness) {
    let response = ctx
        .send(
            TestRequest::post("/users")
                .json(envelope(registration("new@example.com")))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["origin"], "add");
    assert!(response.body["data"]["id"].is_string());
    assert!(response.body["data"]["modification_time"].is_string());
    assert!(response.body.get("error").is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_register_without_terms_rejected(ctx: &TestHarness) {
    let response = ctx
        .send(
            TestRequest::post("/users")
                .json(envelope(json!({
                    "username": "noterms@example.com",
                    "password": PASSWORD,
                })))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "terms not accepted");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_duplicate_username_rejected(ctx: &TestHarness) {
    unconfirmed_user(&ctx.store, "taken@example.com").await;

    let response = ctx
        .send(
            TestRequest::post("/users")
                .json(envelope(registration("taken@example.com")))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "duplicated entry");
}

// ============================================================================
// Envelope freshness
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_replayed_envelope_too_old(ctx: &TestHarness) {
    let response = ctx
        .send(
            TestRequest::post("/users")
                .json(envelope_aged(
                    registration("late@example.com"),
                    Duration::minutes(31),
                ))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "message is too old");
    assert!(ctx
        .store
        .find_user_by_name("late@example.com")
        .await
        .is_err());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_envelope_from_the_future_rejected(ctx: &TestHarness) {
    let response = ctx
        .send(
            TestRequest::post("/users")
                .json(envelope_aged(
                    registration("early@example.com"),
                    Duration::minutes(-5),
                ))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "messages from the future are not allowed");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_malformed_envelope_rejected(ctx: &TestHarness) {
    let response = ctx
        .send(TestRequest::post("/users").raw("{not json").build())
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "unable to decode request JSON");
    assert!(response.body["error"][0].get("debug").is_none());
}

// ============================================================================
// Authentication
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_unknown_user_and_wrong_password_indistinguishable(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "real@example.com").await;
    let uri = format!("/users/{}", user.id);

    let unknown = ctx
        .send(
            TestRequest::get(&uri)
                .basic("ghost@example.com", PASSWORD)
                .build(),
        )
        .await;
    let wrong = ctx
        .send(
            TestRequest::get(&uri)
                .basic("real@example.com", "not the password")
                .build(),
        )
        .await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.description(), wrong.description());
    assert_eq!(unknown.description(), "unauthenticated");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_unconfirmed_user_not_authenticated(ctx: &TestHarness) {
    let user = unconfirmed_user(&ctx.store, "pending@example.com").await;

    let response = ctx
        .send(
            TestRequest::get(&format!("/users/{}", user.id))
                .basic("pending@example.com", PASSWORD)
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_missing_credentials_not_authenticated(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "anon@example.com").await;

    let response = ctx
        .send(TestRequest::get(&format!("/users/{}", user.id)).build())
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Authorization
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_get_self_strips_password(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "self@example.com").await;

    let response = ctx
        .send(
            TestRequest::get(&format!("/users/{}", user.id))
                .basic("self@example.com", PASSWORD)
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["origin"], "get");
    assert_eq!(response.body["data"]["username"], "self@example.com");
    assert!(response.body["data"].get("password").is_none());
    assert!(response.body["data"].get("password_hash").is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_get_other_user_forbidden_without_data(ctx: &TestHarness) {
    confirmed_user(&ctx.store, "nosy@example.com").await;
    let victim = confirmed_user(&ctx.store, "victim@example.com").await;

    let response = ctx
        .send(
            TestRequest::get(&format!("/users/{}", victim.id))
                .basic("nosy@example.com", PASSWORD)
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.description(),
        "user has no authority to perform request"
    );
    assert!(response.body.get("data").is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_forbidden_even_when_target_missing(ctx: &TestHarness) {
    confirmed_user(&ctx.store, "nosy@example.com").await;

    let response = ctx
        .send(
            TestRequest::get(&format!("/users/{}", uuid::Uuid::new_v4()))
                .basic("nosy@example.com", PASSWORD)
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_list_requires_super_user(ctx: &TestHarness) {
    confirmed_user(&ctx.store, "plain@example.com").await;
    super_user(&ctx.store, "root@example.com").await;

    let plain = ctx
        .send(
            TestRequest::get("/users")
                .basic("plain@example.com", PASSWORD)
                .build(),
        )
        .await;
    assert_eq!(plain.status, StatusCode::FORBIDDEN);

    let root = ctx
        .send(
            TestRequest::get("/users")
                .basic("root@example.com", PASSWORD)
                .build(),
        )
        .await;
    assert_eq!(root.status, StatusCode::OK);
    let listed = root.body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|u| u.get("password").is_none()));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_super_user_can_read_anyone(ctx: &TestHarness) {
    super_user(&ctx.store, "admin@example.com").await;
    let other = confirmed_user(&ctx.store, "member@example.com").await;

    let response = ctx
        .send(
            TestRequest::get(&format!("/users/{}", other.id))
                .basic("admin@example.com", PASSWORD)
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "member@example.com");
}

// ============================================================================
// Update and delete
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_update_requires_modification_time(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "upd@example.com").await;

    let response = ctx
        .send(
            TestRequest::put(&format!("/users/{}", user.id))
                .basic("upd@example.com", PASSWORD)
                .json(envelope(json!({ "country_code": "US" })))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "got zero modification time on update");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_update_with_current_modification_time(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "fresh@example.com").await;

    let response = ctx
        .send(
            TestRequest::put(&format!("/users/{}", user.id))
                .basic("fresh@example.com", PASSWORD)
                .json(envelope(json!({
                    "country_code": "MX",
                    "modification_time": user.modification_time,
                })))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["origin"], "update");
    let stored = ctx.store.find_user(user.id).await.unwrap();
    assert_eq!(stored.country_code.as_deref(), Some("MX"));
    assert!(stored.modification_time > user.modification_time);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_update_after_envelope_timestamp_rejected(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "race@example.com").await;

    // Envelope stamped before the record's last modification
    let response = ctx
        .send(
            TestRequest::put(&format!("/users/{}", user.id))
                .basic("race@example.com", PASSWORD)
                .json(envelope_aged(
                    json!({
                        "country_code": "CA",
                        "modification_time": user.modification_time,
                    }),
                    Duration::minutes(1),
                ))
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.description(),
        "message timestamp before entity modification"
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_interleaved_updates_keep_the_newer_write(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "twice@example.com").await;
    let uri = format!("/users/{}", user.id);

    // Both clients read the same record; the first envelope is sealed before
    // the second client's write lands
    let slow = envelope(json!({
        "country_code": "SE",
        "modification_time": user.modification_time,
    }));
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let fast = ctx
        .send(
            TestRequest::put(&uri)
                .basic("twice@example.com", PASSWORD)
                .json(envelope(json!({
                    "country_code": "NO",
                    "modification_time": user.modification_time,
                })))
                .build(),
        )
        .await;
    assert_eq!(fast.status, StatusCode::OK);

    let late = ctx
        .send(
            TestRequest::put(&uri)
                .basic("twice@example.com", PASSWORD)
                .json(slow)
                .build(),
        )
        .await;
    assert_eq!(late.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        late.description(),
        "message timestamp before entity modification"
    );

    let stored = ctx.store.find_user(user.id).await.unwrap();
    assert_eq!(stored.country_code.as_deref(), Some("NO"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_delete_self_then_credentials_stop_working(ctx: &TestHarness) {
    let user = confirmed_user(&ctx.store, "bye@example.com").await;
    let uri = format!("/users/{}", user.id);

    let deleted = ctx
        .send(
            TestRequest::delete(&uri)
                .basic("bye@example.com", PASSWORD)
                .build(),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["data"]["id"], user.id.to_string());

    let after = ctx
        .send(TestRequest::get(&uri).basic("bye@example.com", PASSWORD).build())
        .await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Clients
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_clients_nested_under_owner(ctx: &TestHarness) {
    let owner = confirmed_user(&ctx.store, "owner@example.com").await;
    confirmed_user(&ctx.store, "stranger@example.com").await;
    let collection = format!("/users/{}/clients", owner.id);

    let added = ctx
        .send(
            TestRequest::post(&collection)
                .basic("owner@example.com", PASSWORD)
                .json(envelope(json!({ "name": "laptop", "os": "linux" })))
                .build(),
        )
        .await;
    assert_eq!(added.status, StatusCode::OK);
    let client_id = added.body["data"]["id"].as_str().unwrap().to_string();

    let fetched = ctx
        .send(
            TestRequest::get(&format!("{collection}/{client_id}"))
                .basic("owner@example.com", PASSWORD)
                .build(),
        )
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["name"], "laptop");

    let stranger = ctx
        .send(
            TestRequest::get(&collection)
                .basic("stranger@example.com", PASSWORD)
                .build(),
        )
        .await;
    assert_eq!(stranger.status, StatusCode::FORBIDDEN);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_missing_client_not_found(ctx: &TestHarness) {
    let owner = confirmed_user(&ctx.store, "lost@example.com").await;

    let response = ctx
        .send(
            TestRequest::get(&format!(
                "/users/{}/clients/{}",
                owner.id,
                uuid::Uuid::new_v4()
            ))
            .basic("lost@example.com", PASSWORD)
            .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.description(), "resource not found");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_malformed_id_in_path(ctx: &TestHarness) {
    confirmed_user(&ctx.store, "typo@example.com").await;

    let response = ctx
        .send(
            TestRequest::get("/users/not-a-uuid")
                .basic("typo@example.com", PASSWORD)
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.description(), "id not properly formatted");
}

// ============================================================================
// Infrastructure routes
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_health(ctx: &TestHarness) {
    let response = ctx.send(TestRequest::get("/health").build()).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_prefixed_host_redirects_to_canonical(ctx: &TestHarness) {
    let response = ctx
        .send(
            TestRequest::get("/health")
                .header(axum::http::header::HOST, "www.example.com")
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(
        response.headers.get(axum::http::header::LOCATION).unwrap(),
        "https://example.com/health"
    );
}
