use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::dto::{DisputeResponse, PaginatedResponse};
use crate::auth::middleware::AuthUser;
use crate::entities::dispute::DisputeStatus;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::services::{DisputeService, OpenDispute, PageParams};
use crate::state::AppState;

/// Build the dispute group: `/disputes/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_disputes).post(open_dispute))
        .route("/{id}", get(get_dispute))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenDisputeRequest {
    order_id: Uuid,
    reason: String,
    description: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct DisputeQuery {
    pub(super) offset: Option<u64>,
    pub(super) limit: Option<u64>,
    pub(super) status: Option<DisputeStatus>,
}

/// `POST /api/disputes`
async fn open_dispute(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppJson(body): AppJson<OpenDisputeRequest>,
) -> Result<Response, AppError> {
    let dispute = DisputeService::open(
        &state.db,
        user.id,
        OpenDispute {
            order_id: body.order_id,
            reason: body.reason,
            description: body.description,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DisputeResponse::from(dispute))).into_response())
}

/// `GET /api/disputes`
async fn list_disputes(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppQuery(query): AppQuery<DisputeQuery>,
) -> Result<Json<PaginatedResponse<DisputeResponse>>, AppError> {
    let page = DisputeService::list(
        &state.db,
        Some(user.id),
        query.status,
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `GET /api/disputes/{id}`
async fn get_dispute(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DisputeResponse>, AppError> {
    Ok(Json(
        DisputeService::get_owned(&state.db, user.id, id).await?.into(),
    ))
}
