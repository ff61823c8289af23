use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
}

/// `GET /health`, liveness only.
async fn liveness() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database: "unchecked",
    })
}

/// `GET /api/health`, pings the database.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
                database: "connected",
            }),
        ),
        Err(err) => {
            tracing::warn!("Database ping failed: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    version: env!("CARGO_PKG_VERSION"),
                    database: "disconnected",
                }),
            )
        }
    }
}

pub fn root_router() -> Router<AppState> {
    Router::new().route("/health", get(liveness))
}

pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(readiness))
}
