mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::json;
use uuid::Uuid;

use smm_panel_api::auth::jwt::issue_session_token;
use smm_panel_api::entities::session::{self, SessionScope};
use smm_panel_api::entities::user;

// ──────────────────────────────────────────────────────────────────────────────
// Registration
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_returns_user_and_token() {
    let (app, _) = common::test_app().await;
    let (status, body) = common::post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({
            "email": "Alice@Example.com",
            "username": "alice",
            "password": common::PASSWORD,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["mode"], "task_doer");
    assert_eq!(body["user"]["balance"], 0);
    assert!(body["user"].get("passwordHash").is_none());
    assert!(!body["token"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn duplicate_email_is_rejected_and_not_stored() {
    let (app, state) = common::test_app().await;
    common::register_user(&app, "alice").await;

    let (status, body) = common::post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({
            "email": "alice@example.com",
            "username": "alice_two",
            "password": common::PASSWORD,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let users = user::Entity::find().count(&state.db).await.unwrap_or_default();
    assert_eq!(users, 1);
}

#[tokio::test]
async fn invalid_fields_are_all_reported() {
    let (app, _) = common::test_app().await;
    let (status, body) = common::post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({ "email": "nope", "username": "a", "password": "short" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn malformed_requests_get_the_json_error_body() {
    let (app, _) = common::test_app().await;

    let (status, body) = common::post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({ "email": "a@example.com", "username": "abcdef" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap_or_default().contains("password"));

    let (status, body) = common::post(&app, "/api/auth/login", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (token, _) = common::register_user(&app, "shaped").await;
    let (status, body) = common::get(&app, "/api/orders/not-a-uuid", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, body) = common::get(&app, "/api/transactions?limit=lots", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

// ──────────────────────────────────────────────────────────────────────────────
// Login and sessions
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let (app, _) = common::test_app().await;
    common::register_user(&app, "bob").await;

    let (status, body) = common::post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "bob@example.com", "password": "WrongHorse1" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login_token_authenticates_me() {
    let (app, _) = common::test_app().await;
    common::register_user(&app, "carol").await;

    let (status, body) = common::post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "carol@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap_or_default().to_string();

    let (status, me) = common::get(&app, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "carol");
}

#[tokio::test]
async fn missing_or_garbage_tokens_are_401() {
    let (app, _) = common::test_app().await;
    let (status, _) = common::get(&app, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::get(&app, "/api/auth/me", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "dave").await;

    let (status, _) = common::post(&app, "/api/auth/logout", Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::get(&app, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_session_is_deleted_on_use() {
    let (app, state) = common::test_app().await;
    let (_, user_id) = common::register_user(&app, "erin").await;
    let user_id: Uuid = user_id.parse().unwrap_or_default();

    let now = Utc::now();
    let expires_at = now - Duration::hours(1);
    let session_id = Uuid::new_v4();
    let inserted = session::ActiveModel {
        id: Set(session_id),
        user_id: Set(user_id),
        scope: Set(SessionScope::User),
        ip_address: Set(None),
        user_agent: Set(None),
        created_at: Set((now - Duration::hours(2)).into()),
        last_seen_at: Set((now - Duration::hours(2)).into()),
        expires_at: Set(expires_at.into()),
    }
    .insert(&state.db)
    .await;
    assert!(inserted.is_ok(), "insert failed: {inserted:?}");

    let token = issue_session_token(
        user_id,
        session_id,
        SessionScope::User,
        expires_at,
        &state.config.jwt_secret,
    )
    .unwrap_or_default();

    let (status, body) = common::get(&app, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Session expired.");

    let row = session::Entity::find_by_id(session_id)
        .one(&state.db)
        .await
        .unwrap_or_default();
    assert!(row.is_none());
}

#[tokio::test]
async fn password_change_signs_out_other_sessions() {
    let (app, _) = common::test_app().await;
    let (first, _) = common::register_user(&app, "frank").await;
    let (_, body) = common::post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "frank@example.com", "password": common::PASSWORD }),
    )
    .await;
    let second = body["token"].as_str().unwrap_or_default().to_string();

    let (status, _) = common::post_json(
        &app,
        "/api/users/me/password",
        Some(&first),
        &json!({ "currentPassword": common::PASSWORD, "newPassword": "BatteryStaple2" }),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::get(&app, "/api/auth/me", Some(&first)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = common::get(&app, "/api/auth/me", Some(&second)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "frank@example.com", "password": "BatteryStaple2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn user_token_cannot_reach_admin_routes() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "grace").await;
    let (status, body) = common::get(&app, "/api/admin/users", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}
