use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use super::dto::SessionResponse;
use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::extract::AppPath;
use crate::services::SessionService;
use crate::state::AppState;

/// Build the session management group: `/sessions/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions))
        .route("/revoke-others", post(revoke_others))
        .route("/{id}", delete(revoke_session))
}

#[derive(Serialize)]
struct RevokedResponse {
    revoked: u64,
}

/// `GET /api/sessions`
async fn list_sessions(
    State(state): State<AppState>,
    AuthUser { user, session }: AuthUser,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let sessions = SessionService::list_active(&state.db, user.id).await?;
    Ok(Json(
        sessions
            .into_iter()
            .map(|s| SessionResponse::new(s, session.id))
            .collect(),
    ))
}

/// `DELETE /api/sessions/{id}`
async fn revoke_session(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    SessionService::revoke(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/sessions/revoke-others`
async fn revoke_others(
    State(state): State<AppState>,
    AuthUser { user, session }: AuthUser,
) -> Result<Json<RevokedResponse>, AppError> {
    let revoked = SessionService::revoke_all_for_user(&state.db, user.id, Some(session.id)).await?;
    Ok(Json(RevokedResponse { revoked }))
}
