use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::dto::UserResponse;
use crate::auth::middleware::AuthUser;
use crate::entities::user::UserMode;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::services::{AuthService, UserService};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the user route group: `/users/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route("/me/mode", put(set_mode))
        .route("/me/password", post(change_password))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMeRequest {
    username: Option<String>,
}

#[derive(Deserialize)]
struct SetModeRequest {
    mode: UserMode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/users/me`
async fn get_me(AuthUser { user, .. }: AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

/// `PATCH /api/users/me`
async fn update_me(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppJson(body): AppJson<UpdateMeRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = match body.username {
        Some(username) => UserService::update_username(&state.db, user, &username).await?,
        None => user,
    };
    Ok(Json(user.into()))
}

/// `PUT /api/users/me/mode`
async fn set_mode(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppJson(body): AppJson<SetModeRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::set_mode(&state.db, user, body.mode).await?;
    Ok(Json(user.into()))
}

/// `POST /api/users/me/password`
async fn change_password(
    State(state): State<AppState>,
    AuthUser { user, session }: AuthUser,
    AppJson(body): AppJson<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    AuthService::change_password(
        &state.db,
        user,
        session.id,
        &body.current_password,
        &body.new_password,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
