use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::client_info;
use super::dto::UserResponse;
use crate::auth::middleware::AuthUser;
use crate::entities::user::UserMode;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::services::{AuthOutcome, AuthService, RegisterInput, SessionService};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the auth route group: `/auth/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    email: String,
    username: String,
    password: String,
    mode: Option<UserMode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoginRequest {
    pub(super) email: String,
    pub(super) password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthResponse {
    user: UserResponse,
    token: String,
    expires_at: String,
}

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        Self {
            expires_at: outcome.session.expires_at.to_rfc3339(),
            user: outcome.user.into(),
            token: outcome.token,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/auth/register`
async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<Response, AppError> {
    let outcome = AuthService::register(
        &state.db,
        &state.config,
        RegisterInput {
            email: body.email,
            username: body.username,
            password: body.password,
            mode: body.mode,
        },
        &client_info(&headers),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::from(outcome))).into_response())
}

/// `POST /api/auth/login`
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let outcome = AuthService::login(
        &state.db,
        &state.config,
        &body.email,
        &body.password,
        &client_info(&headers),
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// `POST /api/auth/logout`
async fn logout(
    State(state): State<AppState>,
    AuthUser { user, session }: AuthUser,
) -> Result<StatusCode, AppError> {
    SessionService::revoke(&state.db, user.id, session.id).await?;
    tracing::info!(user_id = %user.id, session_id = %session.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
async fn me(AuthUser { user, .. }: AuthUser) -> Json<UserResponse> {
    Json(user.into())
}
