use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::dto::{PaginatedResponse, TransactionResponse};
use crate::auth::middleware::AuthUser;
use crate::entities::transaction::{TransactionKind, TransactionStatus};
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::services::{
    PageParams, TransactionFilter, TransactionService, WithdrawalRequest,
};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the balance route group: `/transactions/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions))
        .route("/balance", get(balance))
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TransactionQuery {
    offset: Option<u64>,
    limit: Option<u64>,
    kind: Option<TransactionKind>,
    status: Option<TransactionStatus>,
}

#[derive(Deserialize)]
struct DepositRequest {
    amount: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawRequest {
    amount: i64,
    method: String,
    destination: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    balance: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LedgerResponse {
    transaction: TransactionResponse,
    balance: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/transactions`
async fn list_transactions(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppQuery(query): AppQuery<TransactionQuery>,
) -> Result<Json<PaginatedResponse<TransactionResponse>>, AppError> {
    let page = TransactionService::list(
        &state.db,
        TransactionFilter {
            user_id: Some(user.id),
            kind: query.kind,
            status: query.status,
        },
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `GET /api/transactions/balance`
async fn balance(AuthUser { user, .. }: AuthUser) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        balance: user.balance,
    })
}

/// `POST /api/transactions/deposit`
async fn deposit(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppJson(body): AppJson<DepositRequest>,
) -> Result<Response, AppError> {
    let (transaction, balance) =
        TransactionService::deposit(&state.db, user.id, body.amount).await?;
    Ok((
        StatusCode::CREATED,
        Json(LedgerResponse {
            transaction: transaction.into(),
            balance,
        }),
    )
        .into_response())
}

/// `POST /api/transactions/withdraw`
async fn withdraw(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppJson(body): AppJson<WithdrawRequest>,
) -> Result<Response, AppError> {
    let (transaction, balance) = TransactionService::withdraw(
        &state.db,
        user.id,
        WithdrawalRequest {
            amount: body.amount,
            method: body.method,
            destination: body.destination,
        },
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(LedgerResponse {
            transaction: transaction.into(),
            balance,
        }),
    )
        .into_response())
}
