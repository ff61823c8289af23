mod common;

use axum::http::StatusCode;
use serde_json::json;

use smm_panel_api::entities::user::Role;

// ──────────────────────────────────────────────────────────────────────────────
// Devices
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn device_registration_is_idempotent_per_identifier() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "phone_owner").await;
    let body = json!({
        "name": "Pixel",
        "deviceType": "android",
        "deviceIdentifier": "pixel-123",
        "settings": { "notifications": true },
    });

    let (status, first) = common::post_json(&app, "/api/devices", Some(&token), &body).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = common::post_json(&app, "/api/devices", Some(&token), &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);

    let (_, list) = common::get(&app, "/api/devices", Some(&token)).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn device_settings_merge_and_delete() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "tinkerer").await;
    let (_, device) = common::post_json(
        &app,
        "/api/devices",
        Some(&token),
        &json!({
            "name": "Laptop",
            "deviceType": "desktop",
            "deviceIdentifier": "mbp-1",
            "settings": { "theme": "dark", "sound": true },
        }),
    )
    .await;
    let id = device["id"].as_str().unwrap_or_default().to_string();

    let (status, device) = common::put_json(
        &app,
        &format!("/api/devices/{id}/settings"),
        Some(&token),
        &json!({ "theme": "light", "sound": null }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(device["settings"], json!({ "theme": "light" }));

    let (status, _) = common::put_json(
        &app,
        &format!("/api/devices/{id}/settings"),
        Some(&token),
        &json!(["not", "an", "object"]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::delete(&app, &format!("/api/devices/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = common::get(&app, &format!("/api/devices/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn devices_are_private() {
    let (app, _) = common::test_app().await;
    let (owner, _) = common::register_user(&app, "owner").await;
    let (other, _) = common::register_user(&app, "snoop").await;
    let (_, device) = common::post_json(
        &app,
        "/api/devices",
        Some(&owner),
        &json!({ "name": "Tablet", "deviceType": "ios", "deviceIdentifier": "ipad-9" }),
    )
    .await;
    let id = device["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = common::get(&app, &format!("/api/devices/{id}"), Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = common::delete(&app, &format!("/api/devices/{id}"), Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ──────────────────────────────────────────────────────────────────────────────
// Social accounts
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn social_account_lifecycle() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "influencer").await;

    let (status, account) = common::post_json(
        &app,
        "/api/social-accounts",
        Some(&token),
        &json!({ "platform": "instagram", "username": "@insta_me", "accessToken": "secret" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["username"], "insta_me");
    assert_eq!(account["hasAccessToken"], true);
    assert!(account.get("accessToken").is_none());
    let id = account["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = common::post_json(
        &app,
        "/api/social-accounts",
        Some(&token),
        &json!({ "platform": "instagram", "username": "insta_me" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");

    // Same handle on another platform is a different account.
    let (status, _) = common::post_json(
        &app,
        "/api/social-accounts",
        Some(&token),
        &json!({ "platform": "youtube", "username": "insta_me" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = common::get(
        &app,
        "/api/social-accounts?platform=instagram",
        Some(&token),
    )
    .await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, updated) = common::patch_json(
        &app,
        &format!("/api/social-accounts/{id}"),
        Some(&token),
        &json!({ "isActive": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isActive"], false);

    let (status, _) = common::delete(
        &app,
        &format!("/api/social-accounts/{id}"),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = common::get(&app, &format!("/api/social-accounts/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ──────────────────────────────────────────────────────────────────────────────
// Disputes
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dispute_flow_through_review_to_resolution() {
    let (app, state) = common::test_app().await;
    let (token, _) = common::register_user(&app, "unhappy").await;
    common::deposit(&app, &token, 1000).await;
    common::put_json(
        &app,
        "/api/users/me/mode",
        Some(&token),
        &json!({ "mode": "task_giver" }),
    )
    .await;
    let (_, order) = common::post_json(
        &app,
        "/api/orders",
        Some(&token),
        &json!({
            "platform": "youtube",
            "serviceType": "views",
            "targetUrl": "https://youtu.be/dQw4w9WgXcQ",
            "quantity": 10,
        }),
    )
    .await;
    let order_id = order["id"].as_str().unwrap_or_default().to_string();
    let staff = common::login_admin(&app, &state, "support", Role::Moderator).await;

    let dispute_body = json!({
        "orderId": order_id,
        "reason": "Slow delivery",
        "description": "Nothing delivered after a week.",
    });
    let (status, dispute) = common::post_json(
        &app,
        "/api/disputes",
        Some(&token),
        &dispute_body,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dispute["status"], "open");
    let id = dispute["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = common::post_json(&app, "/api/disputes", Some(&token), &dispute_body).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Open disputes must be reviewed before they can be resolved.
    let (status, _) = common::put_json(
        &app,
        &format!("/api/admin/disputes/{id}"),
        Some(&staff),
        &json!({ "status": "resolved", "resolution": "Refunded" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = common::put_json(
        &app,
        &format!("/api/admin/disputes/{id}"),
        Some(&staff),
        &json!({ "status": "under_review" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::put_json(
        &app,
        &format!("/api/admin/disputes/{id}"),
        Some(&staff),
        &json!({ "status": "resolved" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, resolved) = common::put_json(
        &app,
        &format!("/api/admin/disputes/{id}"),
        Some(&staff),
        &json!({ "status": "resolved", "resolution": "Order expedited" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "resolved");
    assert!(resolved["resolvedAt"].is_string());
    assert!(resolved["resolvedBy"].is_string());

    let (_, mine) = common::get(&app, "/api/disputes", Some(&token)).await;
    assert_eq!(mine["total"], 1);
}

#[tokio::test]
async fn competing_staff_updates_apply_once() {
    let (app, state) = common::test_app().await;
    let (token, _) = common::register_user(&app, "impatient").await;
    common::deposit(&app, &token, 1000).await;
    common::put_json(
        &app,
        "/api/users/me/mode",
        Some(&token),
        &json!({ "mode": "task_giver" }),
    )
    .await;
    let (_, order) = common::post_json(
        &app,
        "/api/orders",
        Some(&token),
        &json!({
            "platform": "instagram",
            "serviceType": "followers",
            "targetUrl": "https://instagram.com/brand",
            "quantity": 10,
        }),
    )
    .await;
    let (status, dispute) = common::post_json(
        &app,
        "/api/disputes",
        Some(&token),
        &json!({
            "orderId": order["id"],
            "reason": "Wrong account",
            "description": "Followers went to the wrong profile.",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!(
        "/api/admin/disputes/{}",
        dispute["id"].as_str().unwrap_or_default()
    );
    let first = common::login_admin(&app, &state, "support_a", Role::Moderator).await;
    let second = common::login_admin(&app, &state, "support_b", Role::Moderator).await;

    let review = json!({ "status": "under_review" });
    let ((a, _), (b, _)) = tokio::join!(
        common::put_json(&app, &uri, Some(&first), &review),
        common::put_json(&app, &uri, Some(&second), &review),
    );
    let statuses = [a, b];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(),
        1
    );

    let (_, current) = common::get(&app, &uri, Some(&first)).await;
    assert_eq!(current["status"], "under_review");
}

#[tokio::test]
async fn disputes_require_an_owned_order() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "nosy").await;
    let (status, _) = common::post_json(
        &app,
        "/api/disputes",
        Some(&token),
        &json!({
            "orderId": "00000000-0000-0000-0000-000000000000",
            "reason": "Bad",
            "description": "Not mine anyway.",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ──────────────────────────────────────────────────────────────────────────────
// Sessions
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sessions_can_be_listed_and_revoked() {
    let (app, _) = common::test_app().await;
    let (first, _) = common::register_user(&app, "multi").await;
    let (_, login) = common::post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "multi@example.com", "password": common::PASSWORD }),
    )
    .await;
    let second = login["token"].as_str().unwrap_or_default().to_string();

    let (status, sessions) = common::get(&app, "/api/sessions", Some(&first)).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = sessions.as_array().cloned().unwrap_or_default();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions.iter().filter(|s| s["current"] == true).count(), 1);

    let (status, body) = common::post(&app, "/api/sessions/revoke-others", Some(&first)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 1);

    let (status, _) = common::get(&app, "/api/auth/me", Some(&second)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
