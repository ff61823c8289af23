#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{Value, json};
use tower::ServiceExt;

use smm_panel_api::config::{Config, Environment};
use smm_panel_api::entities::user::{self, Role};
use smm_panel_api::state::AppState;

pub const PASSWORD: &str = "CorrectHorse1";

/// Fresh app backed by a migrated in-memory SQLite database.
pub async fn test_app() -> (Router, AppState) {
    let db = smm_panel_api::db::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let state = AppState {
        db,
        config: Config {
            database_url: String::new(),
            server_host: std::net::IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            session_ttl_secs: 3600,
            admin_session_ttl_secs: 3600,
            frontend_url: "http://localhost:5173".to_string(),
            admin_url: "http://localhost:5174".to_string(),
            maintenance_interval_secs: 0,
        },
    };

    (
        smm_panel_api::routes::router().with_state(state.clone()),
        state,
    )
}

/// Send a request and return (status, JSON body). Empty bodies decode to `Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_default();

    let response = app.clone().oneshot(request).await.unwrap_or_default();
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();

    (status, serde_json::from_slice(&bytes).unwrap_or_default())
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::POST, uri, token, None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, token, Some(body)).await
}

pub async fn patch_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, token, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, token, None).await
}

/// Register `username` (email `<username>@example.com`) and return (`token`, `user_id`).
pub async fn register_user(app: &Router, username: &str) -> (String, String) {
    let (status, body) = post_json(
        app,
        "/api/auth/register",
        None,
        &json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "password": PASSWORD,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["token"].as_str().unwrap_or_default().to_string(),
        body["user"]["id"].as_str().unwrap_or_default().to_string(),
    )
}

/// Register a user, promote it to `role` and sign in through the admin panel.
pub async fn login_admin(app: &Router, state: &AppState, username: &str, role: Role) -> String {
    register_user(app, username).await;
    let promoted = user::Entity::update_many()
        .col_expr(user::Column::Role, Expr::value(role))
        .filter(user::Column::Username.eq(username))
        .exec(&state.db)
        .await;
    assert!(promoted.is_ok(), "promote failed: {promoted:?}");

    let (status, body) = post_json(
        app,
        "/api/admin/auth/login",
        None,
        &json!({ "email": format!("{username}@example.com"), "password": PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
    body["token"].as_str().unwrap_or_default().to_string()
}

/// Top up a user's wallet through the API.
pub async fn deposit(app: &Router, token: &str, amount: i64) -> Value {
    let (status, body) = post_json(
        app,
        "/api/transactions/deposit",
        Some(token),
        &json!({ "amount": amount }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "deposit failed: {body}");
    body
}
