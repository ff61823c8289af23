mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn liveness_does_not_touch_the_database() {
    let (app, _) = common::test_app().await;
    let (status, body) = common::get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "unchecked");
}

#[tokio::test]
async fn readiness_pings_the_database() {
    let (app, _) = common::test_app().await;
    let (status, body) = common::get(&app, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _) = common::test_app().await;
    let (status, _) = common::get(&app, "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
