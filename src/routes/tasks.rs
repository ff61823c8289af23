use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::dto::{PaginatedResponse, TaskResponse};
use crate::auth::middleware::AuthUser;
use crate::entities::Platform;
use crate::entities::task::TaskStatus;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::services::{PageParams, TaskService};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the task route group: `/tasks/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/available", get(list_available))
        .route("/mine", get(list_mine))
        .route("/{id}/claim", post(claim))
        .route("/{id}/release", post(release))
        .route("/{id}/complete", post(complete))
        .route("/{id}/review", post(review))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AvailableQuery {
    offset: Option<u64>,
    limit: Option<u64>,
    platform: Option<Platform>,
}

#[derive(Debug, Deserialize)]
struct MineQuery {
    offset: Option<u64>,
    limit: Option<u64>,
    status: Option<TaskStatus>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimRequest {
    social_account_id: Option<Uuid>,
}

#[derive(Default, Deserialize)]
struct CompleteRequest {
    proof: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct ReviewRequest {
    pub(super) approve: bool,
    pub(super) reason: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/tasks/available`
async fn list_available(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppQuery(query): AppQuery<AvailableQuery>,
) -> Result<Json<PaginatedResponse<TaskResponse>>, AppError> {
    let page = TaskService::list_available(
        &state.db,
        user.id,
        query.platform,
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `GET /api/tasks/mine`
async fn list_mine(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppQuery(query): AppQuery<MineQuery>,
) -> Result<Json<PaginatedResponse<TaskResponse>>, AppError> {
    let page = TaskService::list_mine(
        &state.db,
        user.id,
        query.status,
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `POST /api/tasks/{id}/claim`
async fn claim(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
    body: Option<AppJson<ClaimRequest>>,
) -> Result<Json<TaskResponse>, AppError> {
    let AppJson(body) = body.unwrap_or_default();
    let task = TaskService::claim(&state.db, &user, id, body.social_account_id).await?;
    Ok(Json(task.into()))
}

/// `POST /api/tasks/{id}/release`
async fn release(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = TaskService::release(&state.db, user.id, id).await?;
    Ok(Json(task.into()))
}

/// `POST /api/tasks/{id}/complete`
async fn complete(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
    body: Option<AppJson<CompleteRequest>>,
) -> Result<Json<TaskResponse>, AppError> {
    let AppJson(body) = body.unwrap_or_default();
    let task = TaskService::complete(&state.db, user.id, id, body.proof).await?;
    Ok(Json(task.into()))
}

/// `POST /api/tasks/{id}/review`, by the owner of the task's order.
async fn review(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<ReviewRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = TaskService::review(&state.db, &user, false, id, body.approve, body.reason).await?;
    Ok(Json(task.into()))
}
