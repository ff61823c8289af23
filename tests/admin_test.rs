mod common;

use axum::http::StatusCode;
use serde_json::json;

use smm_panel_api::entities::user::Role;

#[tokio::test]
async fn plain_users_cannot_sign_in_to_the_panel() {
    let (app, _) = common::test_app().await;
    common::register_user(&app, "civilian").await;
    let (status, _) = common::post_json(
        &app,
        "/api/admin/auth/login",
        None,
        &json!({ "email": "civilian@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_session_resolves_the_operator() {
    let (app, state) = common::test_app().await;
    let admin = common::login_admin(&app, &state, "chief", Role::Admin).await;
    let (status, me) = common::get(&app, "/api/admin/auth/me", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "admin");
}

#[tokio::test]
async fn moderators_are_limited_to_staff_routes() {
    let (app, state) = common::test_app().await;
    let moderator = common::login_admin(&app, &state, "mod", Role::Moderator).await;

    let (status, users) = common::get(&app, "/api/admin/users?search=mo", Some(&moderator)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["total"], 1);

    let (status, _) = common::get(&app, "/api/admin/settings", Some(&moderator)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = common::get(&app, "/api/admin/transactions", Some(&moderator)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn suspension_locks_the_user_out() {
    let (app, state) = common::test_app().await;
    let (token, user_id) = common::register_user(&app, "rulebreaker").await;
    let admin = common::login_admin(&app, &state, "warden", Role::Admin).await;

    let (status, _) = common::put_json(
        &app,
        &format!("/api/admin/users/{user_id}/status"),
        Some(&admin),
        &json!({ "status": "suspended" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::put_json(
        &app,
        &format!("/api/admin/users/{user_id}/status"),
        Some(&admin),
        &json!({ "status": "suspended", "reason": "y".repeat(401) }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, user) = common::put_json(
        &app,
        &format!("/api/admin/users/{user_id}/status"),
        Some(&admin),
        &json!({ "status": "suspended", "reason": "Fake engagement" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["accountStatus"], "suspended");

    let (status, _) = common::get(&app, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "rulebreaker@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_super_admins_change_roles() {
    let (app, state) = common::test_app().await;
    let (_, user_id) = common::register_user(&app, "promotable").await;
    let admin = common::login_admin(&app, &state, "regular_admin", Role::Admin).await;
    let root = common::login_admin(&app, &state, "root", Role::SuperAdmin).await;

    let body = json!({ "role": "moderator" });
    let (status, _) = common::put_json(
        &app,
        &format!("/api/admin/users/{user_id}/role"),
        Some(&admin),
        &body,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, user) = common::put_json(
        &app,
        &format!("/api/admin/users/{user_id}/role"),
        Some(&root),
        &body,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "moderator");
}

#[tokio::test]
async fn settings_control_registration_and_limits() {
    let (app, state) = common::test_app().await;
    let admin = common::login_admin(&app, &state, "config_admin", Role::Admin).await;

    let (status, settings) = common::get(&app, "/api/admin/settings", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings.as_array().map(Vec::len), Some(4));

    let (status, _) = common::put_json(
        &app,
        "/api/admin/settings/min_deposit",
        Some(&admin),
        &json!({ "value": "lots" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::put_json(
        &app,
        "/api/admin/settings/no_such_key",
        Some(&admin),
        &json!({ "value": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, setting) = common::put_json(
        &app,
        "/api/admin/settings/registration_open",
        Some(&admin),
        &json!({ "value": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(setting["value"], "false");
    assert_eq!(setting["isDefault"], false);

    let (status, _) = common::post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({
            "email": "late@example.com",
            "username": "latecomer",
            "password": common::PASSWORD,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn maintenance_can_be_triggered_by_super_admins() {
    let (app, state) = common::test_app().await;
    let root = common::login_admin(&app, &state, "janitor", Role::SuperAdmin).await;
    let (status, report) = common::post(&app, "/api/admin/maintenance/run", Some(&root)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["sessionsPurged"], 0);
    assert_eq!(report["usersRecalculated"], 0);
}
