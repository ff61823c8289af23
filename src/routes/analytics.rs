use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::entities::order_statistic::Timeframe;
use crate::error::AppError;
use crate::extract::AppQuery;
use crate::services::{AnalyticsService, BalancePoint, TransactionSummary};
use crate::state::AppState;

/// Build the analytics group: `/analytics/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/balance-history", get(balance_history))
        .route("/transaction-summary", get(transaction_summary))
}

#[derive(Deserialize)]
struct PeriodQuery {
    period: Option<String>,
}

impl PeriodQuery {
    fn timeframe(&self) -> Result<Timeframe, AppError> {
        match self.period.as_deref() {
            None => Ok(Timeframe::Month),
            Some(raw) => Timeframe::parse(raw).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Unknown period '{raw}'. Use one of 7d, 30d, 90d, 1y."
                ))
            }),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceHistoryResponse {
    period: Timeframe,
    points: Vec<BalancePoint>,
}

/// `GET /api/analytics/balance-history?period=30d`
async fn balance_history(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> Result<Json<BalanceHistoryResponse>, AppError> {
    let period = query.timeframe()?;
    let points = AnalyticsService::balance_history(&state.db, user.id, period).await?;
    Ok(Json(BalanceHistoryResponse { period, points }))
}

/// `GET /api/analytics/transaction-summary?period=30d`
async fn transaction_summary(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> Result<Json<TransactionSummary>, AppError> {
    let period = query.timeframe()?;
    Ok(Json(
        AnalyticsService::transaction_summary(&state.db, user.id, period).await?,
    ))
}
