mod common;

use axum::http::StatusCode;
use serde_json::json;

use smm_panel_api::entities::user::Role;

#[tokio::test]
async fn three_deposits_show_up_in_the_summary() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "saver").await;

    for _ in 0..3 {
        common::deposit(&app, &token, 1000).await;
    }

    let (status, body) = common::get(&app, "/api/transactions/balance", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 3000);

    let (status, summary) = common::get(
        &app,
        "/api/analytics/transaction-summary?period=7d",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let deposits = summary["byKind"]
        .as_array()
        .and_then(|kinds| kinds.iter().find(|k| k["kind"] == "deposit"))
        .cloned()
        .unwrap_or_default();
    assert_eq!(deposits["count"], 3);
    assert_eq!(deposits["total"], 3000);
    assert_eq!(summary["netChange"], 3000);

    let (status, history) = common::get(
        &app,
        "/api/analytics/balance-history?period=7d",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let points = history["points"].as_array().cloned().unwrap_or_default();
    assert_eq!(points.len(), 7);
    assert_eq!(points.last().map(|p| p["balance"].clone()), Some(json!(3000)));
}

#[tokio::test]
async fn unknown_period_is_400() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "periodic").await;
    let (status, _) = common::get(
        &app,
        "/api/analytics/transaction-summary?period=2w",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deposit_below_minimum_is_rejected() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "tiny").await;
    let (status, _) = common::post_json(
        &app,
        "/api/transactions/deposit",
        Some(&token),
        &json!({ "amount": 50 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn withdrawal_cannot_overdraw() {
    let (app, _) = common::test_app().await;
    let (token, _) = common::register_user(&app, "spender").await;
    common::deposit(&app, &token, 600).await;

    let (status, body) = common::post_json(
        &app,
        "/api/transactions/withdraw",
        Some(&token),
        &json!({ "amount": 1000, "method": "paypal", "destination": "me@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Insufficient balance.");

    let (_, body) = common::get(&app, "/api/transactions/balance", Some(&token)).await;
    assert_eq!(body["balance"], 600);
}

#[tokio::test]
async fn rejected_withdrawal_releases_the_hold() {
    let (app, state) = common::test_app().await;
    let (token, user_id) = common::register_user(&app, "payee").await;
    let admin = common::login_admin(&app, &state, "boss", Role::Admin).await;
    common::deposit(&app, &token, 2000).await;

    let (status, body) = common::post_json(
        &app,
        "/api/transactions/withdraw",
        Some(&token),
        &json!({ "amount": 1500, "method": "bank", "destination": "DE00 1234" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["balance"], 500);
    assert_eq!(body["transaction"]["status"], "pending");
    let id = body["transaction"]["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = common::post_json(
        &app,
        &format!("/api/admin/withdrawals/{id}/reject"),
        Some(&admin),
        &json!({ "reason": "Destination invalid" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "failed");

    let (_, body) = common::get(&app, "/api/transactions/balance", Some(&token)).await;
    assert_eq!(body["balance"], 2000);

    // A settled withdrawal cannot be settled again.
    let (status, _) = common::post(
        &app,
        &format!("/api/admin/withdrawals/{id}/approve"),
        Some(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = common::get(
        &app,
        &format!("/api/admin/users/{user_id}/reconcile"),
        Some(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["consistent"], true);
    assert_eq!(body["storedBalance"], 2000);
}

#[tokio::test]
async fn admin_adjustment_cannot_go_negative() {
    let (app, state) = common::test_app().await;
    let (token, user_id) = common::register_user(&app, "adjusted").await;
    let admin = common::login_admin(&app, &state, "auditor", Role::Admin).await;
    common::deposit(&app, &token, 300).await;

    let (status, body) = common::post_json(
        &app,
        &format!("/api/admin/users/{user_id}/balance"),
        Some(&admin),
        &json!({ "amount": -200, "reason": "Chargeback" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 100);

    let (status, _) = common::post_json(
        &app,
        &format!("/api/admin/users/{user_id}/balance"),
        Some(&admin),
        &json!({ "amount": -200, "reason": "Chargeback" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = common::get(&app, "/api/transactions?kind=adjustment", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn adjustment_amount_and_reason_are_bounded() {
    let (app, state) = common::test_app().await;
    let (token, user_id) = common::register_user(&app, "bounded").await;
    let admin = common::login_admin(&app, &state, "bounds", Role::Admin).await;
    common::deposit(&app, &token, 300).await;
    let uri = format!("/api/admin/users/{user_id}/balance");

    for amount in [i64::MIN, i64::MAX, 0] {
        let (status, body) = common::post_json(
            &app,
            &uri,
            Some(&admin),
            &json!({ "amount": amount, "reason": "Correction" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}: {body}");
    }

    let (status, _) = common::post_json(
        &app,
        &uri,
        Some(&admin),
        &json!({ "amount": 100, "reason": "x".repeat(401) }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = common::get(&app, "/api/transactions/balance", Some(&token)).await;
    assert_eq!(body["balance"], 300);

    let (status, body) = common::get(
        &app,
        &format!("/api/admin/users/{user_id}/reconcile"),
        Some(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["consistent"], true);
}
