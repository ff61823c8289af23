use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::dto::SocialAccountResponse;
use crate::auth::middleware::AuthUser;
use crate::entities::Platform;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::services::{
    CreateSocialAccount, SocialAccountService, SocialAccountStats, UpdateSocialAccount,
};
use crate::state::AppState;

/// Build the social account group: `/social-accounts/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route(
            "/{id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/{id}/stats", get(account_stats))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountRequest {
    platform: Platform,
    username: String,
    external_id: Option<String>,
    access_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest {
    is_active: Option<bool>,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct PlatformQuery {
    platform: Option<Platform>,
}

/// `POST /api/social-accounts`
async fn create_account(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppJson(body): AppJson<CreateAccountRequest>,
) -> Result<Response, AppError> {
    let account = SocialAccountService::create(
        &state.db,
        user.id,
        CreateSocialAccount {
            platform: body.platform,
            username: body.username,
            external_id: body.external_id,
            access_token: body.access_token,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(SocialAccountResponse::from(account))).into_response())
}

/// `GET /api/social-accounts`
async fn list_accounts(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppQuery(query): AppQuery<PlatformQuery>,
) -> Result<Json<Vec<SocialAccountResponse>>, AppError> {
    let accounts = SocialAccountService::list(&state.db, user.id, query.platform).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// `GET /api/social-accounts/{id}`
async fn get_account(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<SocialAccountResponse>, AppError> {
    Ok(Json(
        SocialAccountService::get(&state.db, user.id, id).await?.into(),
    ))
}

/// `GET /api/social-accounts/{id}/stats`
async fn account_stats(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<SocialAccountStats>, AppError> {
    Ok(Json(SocialAccountService::stats(&state.db, user.id, id).await?))
}

/// `PATCH /api/social-accounts/{id}`
async fn update_account(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateAccountRequest>,
) -> Result<Json<SocialAccountResponse>, AppError> {
    let account = SocialAccountService::update(
        &state.db,
        user.id,
        id,
        UpdateSocialAccount {
            is_active: body.is_active,
            access_token: body.access_token,
        },
    )
    .await?;
    Ok(Json(account.into()))
}

/// `DELETE /api/social-accounts/{id}`
async fn delete_account(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    SocialAccountService::delete(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
