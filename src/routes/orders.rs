use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dto::{OrderResponse, OrderStatisticResponse, PaginatedResponse, TaskResponse};
use crate::auth::middleware::AuthUser;
use crate::entities::Platform;
use crate::entities::order::{OrderStatus, ServiceType};
use crate::entities::order_statistic::Timeframe;
use crate::entities::task::TaskStatus;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::services::pricing::{self, Rate};
use crate::services::{
    CreateOrder, OrderFilter, OrderService, OrderStatisticsService, PageParams, TaskService,
};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the order route group: `/orders/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/pricing", get(price_list))
        .route("/statistics", get(statistics))
        .route("/statistics/recalculate", post(recalculate_statistics))
        .route("/{id}", get(get_order))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/tasks", get(order_tasks))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest {
    platform: Platform,
    service_type: ServiceType,
    target_url: String,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct OrderQuery {
    offset: Option<u64>,
    limit: Option<u64>,
    status: Option<OrderStatus>,
    platform: Option<Platform>,
}

#[derive(Debug, Deserialize)]
struct OrderTasksQuery {
    offset: Option<u64>,
    limit: Option<u64>,
    status: Option<TaskStatus>,
}

#[derive(Deserialize)]
struct StatisticsQuery {
    timeframe: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceEntry {
    platform: Platform,
    service_type: ServiceType,
    #[serde(flatten)]
    rate: Rate,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/orders`
async fn create_order(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppJson(body): AppJson<CreateOrderRequest>,
) -> Result<Response, AppError> {
    let order = OrderService::create(
        &state.db,
        &user,
        CreateOrder {
            platform: body.platform,
            service_type: body.service_type,
            target_url: body.target_url,
            quantity: body.quantity,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))).into_response())
}

/// `GET /api/orders`
async fn list_orders(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppQuery(query): AppQuery<OrderQuery>,
) -> Result<Json<PaginatedResponse<OrderResponse>>, AppError> {
    let page = OrderService::list(
        &state.db,
        OrderFilter {
            user_id: Some(user.id),
            status: query.status,
            platform: query.platform,
        },
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `GET /api/orders/pricing`
async fn price_list() -> Json<Vec<PriceEntry>> {
    let mut entries = Vec::new();
    for platform in [Platform::Instagram, Platform::Youtube] {
        for service_type in [
            ServiceType::Likes,
            ServiceType::Followers,
            ServiceType::Views,
            ServiceType::Subscribers,
        ] {
            if let Some(rate) = pricing::quote(platform, service_type) {
                entries.push(PriceEntry {
                    platform,
                    service_type,
                    rate,
                });
            }
        }
    }
    Json(entries)
}

/// `GET /api/orders/{id}`
async fn get_order(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = OrderService::get_owned(&state.db, user.id, id).await?;
    Ok(Json(order.into()))
}

/// `POST /api/orders/{id}/cancel`
async fn cancel_order(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = OrderService::cancel(&state.db, user.id, id).await?;
    Ok(Json(order.into()))
}

/// `GET /api/orders/{id}/tasks`
async fn order_tasks(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<OrderTasksQuery>,
) -> Result<Json<PaginatedResponse<TaskResponse>>, AppError> {
    let order = OrderService::get_owned(&state.db, user.id, id).await?;
    let page = TaskService::list_for_order(
        &state.db,
        order.id,
        query.status,
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `GET /api/orders/statistics?timeframe=30d`
async fn statistics(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppQuery(query): AppQuery<StatisticsQuery>,
) -> Result<Json<Vec<OrderStatisticResponse>>, AppError> {
    let timeframe = query
        .timeframe
        .as_deref()
        .map(|raw| {
            Timeframe::parse(raw).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Unknown timeframe '{raw}'. Use one of 7d, 30d, 90d, 1y."
                ))
            })
        })
        .transpose()?;

    let rows = OrderStatisticsService::list(&state.db, user.id, timeframe).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// `POST /api/orders/statistics/recalculate`
async fn recalculate_statistics(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
) -> Result<Json<Vec<OrderStatisticResponse>>, AppError> {
    let rows = OrderStatisticsService::recalculate_for_user(&state.db, user.id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
