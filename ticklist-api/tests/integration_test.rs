/// Integration tests for the Ticklist API
///
/// These tests run the full router against a live Postgres database
/// (DATABASE_URL + JWT_SECRET from the environment) and verify:
/// - Registration, login, and token subject round-trips
/// - Credential failures and their uniform 401 shape
/// - Task CRUD with ownership scoping (foreign rows read as 404)
/// - Delete idempotence
/// - Token failure codes from the middleware
/// - The chat surface dispatching onto task operations
mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{body_json, TestContext};
use serde_json::json;
use ticklist_shared::auth::jwt::{create_token, validate_token, Claims};
use uuid::Uuid;

#[tokio::test]
async fn test_register_then_login_round_trip() {
    let mut ctx = TestContext::new().await.unwrap();

    let email = format!("alice-{}@example.com", Uuid::new_v4());
    let user = ctx.register_with(&email, "secret123").await.unwrap();

    // The registration token already carries the new subject
    let claims = validate_token(&user.token, &ctx.config.jwt.secret).unwrap();
    assert_eq!(claims.sub, user.id);

    // A subsequent login with the same credentials succeeds...
    let response = ctx
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "secret123" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["expires_in"].as_i64().unwrap() > 0);

    // ...and its token decodes to the registered subject
    let claims = validate_token(body["token"].as_str().unwrap(), &ctx.config.jwt.secret).unwrap();
    assert_eq!(claims.sub, user.id);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let mut ctx = TestContext::new().await.unwrap();

    let email = format!("dup-{}@example.com", Uuid::new_v4());
    ctx.register_with(&email, "secret123").await.unwrap();

    let response = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": email, "password": "other-secret" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Email uniqueness is case-insensitive at the store level
    let response = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": email.to_uppercase(), "password": "other-secret" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new().await.unwrap();

    // Malformed email
    let response = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "secret123" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "validation_error");

    // Too-short password
    let response = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": "someone@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let mut ctx = TestContext::new().await.unwrap();

    let email = format!("carol-{}@example.com", Uuid::new_v4());
    ctx.register_with(&email, "secret123").await.unwrap();

    // Wrong password for a known email
    let response = ctx
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrong-password" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_password_body = body_json(response).await;

    // Unknown email entirely
    let response = ctx
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({
                "email": format!("ghost-{}@example.com", Uuid::new_v4()),
                "password": "wrong-password"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_email_body = body_json(response).await;

    // Same code, same message: no user enumeration through the body
    assert_eq!(wrong_password_body, unknown_email_body);
    assert_eq!(wrong_password_body["error"], "invalid_credentials");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_me_returns_subject_profile() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user().await.unwrap();

    let response = ctx.request("GET", "/auth/me", Some(&user.token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["subject_id"], user.id.to_string());
    assert_eq!(body["email"], user.email);

    let response = ctx.request("GET", "/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_missing_token_code() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.request("GET", "/tasks", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "token_missing");
}

#[tokio::test]
async fn test_expired_and_invalid_token_codes() {
    let ctx = TestContext::new().await.unwrap();

    // Expired but correctly signed
    let claims = Claims::with_expiration(Uuid::new_v4(), Duration::seconds(-60));
    let stale = create_token(&claims, &ctx.config.jwt.secret).unwrap();

    let response = ctx.request("GET", "/tasks", Some(&stale), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "token_expired");

    // Garbage token
    let response = ctx.request("GET", "/tasks", Some("garbage"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "token_invalid");
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user().await.unwrap();

    let response = ctx
        .request(
            "POST",
            "/tasks",
            Some(&user.token),
            Some(json!({ "title": "Buy milk", "description": "Two liters" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["title"], "Buy milk");
    assert_eq!(created["description"], "Two liters");
    assert_eq!(created["completed"], false);
    assert!(created["id"].as_str().unwrap().parse::<Uuid>().is_ok());
    assert!(created["created_at"].is_string());
    assert!(created["updated_at"].is_string());

    let task_id = created["id"].as_str().unwrap();
    let response = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&user.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = body_json(response).await;
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["title"], created["title"]);
    assert_eq!(fetched["description"], created["description"]);
    assert_eq!(fetched["completed"], created["completed"]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_create_task_validation() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user().await.unwrap();

    let response = ctx
        .request("POST", "/tasks", Some(&user.token), Some(json!({ "title": "" })))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .request(
            "POST",
            "/tasks",
            Some(&user.token),
            Some(json!({ "title": "x".repeat(201) })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_update_patches_only_given_fields() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user().await.unwrap();

    let response = ctx
        .request(
            "POST",
            "/tasks",
            Some(&user.token),
            Some(json!({ "title": "Water plants" })),
        )
        .await;
    let created = body_json(response).await;
    let task_id = created["id"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "PUT",
            &format!("/tasks/{}", task_id),
            Some(&user.token),
            Some(json!({ "completed": true })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await;
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["title"], "Water plants");

    let created_at =
        chrono::DateTime::parse_from_rfc3339(created["updated_at"].as_str().unwrap()).unwrap();
    let updated_at =
        chrono::DateTime::parse_from_rfc3339(updated["updated_at"].as_str().unwrap()).unwrap();
    assert!(updated_at >= created_at);

    // Title re-validated when present in the patch
    let response = ctx
        .request(
            "PUT",
            &format!("/tasks/{}", task_id),
            Some(&user.token),
            Some(json!({ "title": "" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user().await.unwrap();

    let mut ids = Vec::new();
    for title in ["one", "two", "three"] {
        let response = ctx
            .request("POST", "/tasks", Some(&user.token), Some(json!({ "title": title })))
            .await;
        ids.push(body_json(response).await["id"].as_str().unwrap().to_string());
    }

    ctx.request(
        "PUT",
        &format!("/tasks/{}", ids[0]),
        Some(&user.token),
        Some(json!({ "completed": true })),
    )
    .await;

    // Full list, newest first
    let response = ctx.request("GET", "/tasks", Some(&user.token), None).await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["tasks"][0]["title"], "three");

    // Completion filter
    let response = ctx
        .request("GET", "/tasks?completed=true", Some(&user.token), None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["tasks"][0]["title"], "one");

    // Pagination caps the page but reports the full total
    let response = ctx
        .request("GET", "/tasks?limit=2&offset=0", Some(&user.token), None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(body["total"], 3);
    assert_eq!(body["limit"], 2);

    // Out-of-range limit is a validation error
    let response = ctx
        .request("GET", "/tasks?limit=500", Some(&user.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_foreign_task_reads_as_not_found() {
    let mut ctx = TestContext::new().await.unwrap();
    let alice = ctx.register_user().await.unwrap();
    let bob = ctx.register_user().await.unwrap();

    let response = ctx
        .request(
            "POST",
            "/tasks",
            Some(&alice.token),
            Some(json!({ "title": "Alice's secret task" })),
        )
        .await;
    let task_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Bob's get/update/delete must all be plain 404s, leaking nothing
    let response = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&bob.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");
    assert!(!body["message"].as_str().unwrap().contains("Alice"));

    let response = ctx
        .request(
            "PUT",
            &format!("/tasks/{}", task_id),
            Some(&bob.token),
            Some(json!({ "completed": true })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .request("DELETE", &format!("/tasks/{}", task_id), Some(&bob.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Alice's task is untouched by any of it
    let response = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&alice.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["completed"], false);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_delete_is_idempotently_not_found() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user().await.unwrap();

    let response = ctx
        .request("POST", "/tasks", Some(&user.token), Some(json!({ "title": "ephemeral" })))
        .await;
    let task_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = ctx
        .request("DELETE", &format!("/tasks/{}", task_id), Some(&user.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Second delete: same 404 as an id that never existed
    let response = ctx
        .request("DELETE", &format!("/tasks/{}", task_id), Some(&user.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .request(
            "DELETE",
            &format!("/tasks/{}", Uuid::new_v4()),
            Some(&user.token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_chat_creates_and_lists_tasks() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user().await.unwrap();

    // One instruction, one task operation
    let response = ctx
        .request(
            "POST",
            "/chat",
            Some(&user.token),
            Some(json!({ "message": "add buy milk" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let conversation_id = body["conversation_id"].as_str().unwrap().to_string();
    let task_id = body["task_id"].as_str().unwrap().to_string();

    // The created task is visible through the normal REST surface
    let response = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&user.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "buy milk");

    // Continuing the conversation lists through the same scope
    let response = ctx
        .request(
            "POST",
            "/chat",
            Some(&user.token),
            Some(json!({ "message": "list", "conversation_id": conversation_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["reply"]
        .as_str()
        .unwrap()
        .contains("buy milk"));

    // The transcript recorded both turns
    let response = ctx
        .request("GET", &format!("/chat/{}", conversation_id), Some(&user.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let transcript = body_json(response).await;
    let messages = transcript["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_chat_conversation_is_owner_scoped() {
    let mut ctx = TestContext::new().await.unwrap();
    let alice = ctx.register_user().await.unwrap();
    let bob = ctx.register_user().await.unwrap();

    let response = ctx
        .request(
            "POST",
            "/chat",
            Some(&alice.token),
            Some(json!({ "message": "add call mom" })),
        )
        .await;
    let conversation_id = body_json(response).await["conversation_id"]
        .as_str()
        .unwrap()
        .to_string();

    // Bob cannot read or continue Alice's conversation
    let response = ctx
        .request("GET", &format!("/chat/{}", conversation_id), Some(&bob.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .request(
            "POST",
            "/chat",
            Some(&bob.token),
            Some(json!({ "message": "list", "conversation_id": conversation_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // And Bob's agent cannot see Alice's tasks
    let response = ctx
        .request("POST", "/chat", Some(&bob.token), Some(json!({ "message": "list" })))
        .await;
    assert!(!body_json(response).await["reply"]
        .as_str()
        .unwrap()
        .contains("call mom"));

    ctx.cleanup().await.unwrap();
}
