use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::{AuthResponse, LoginRequest};
use super::client_info;
use super::disputes::DisputeQuery;
use super::dto::{
    DisputeResponse, OrderResponse, PaginatedResponse, SettingResponse, TaskResponse,
    TransactionResponse, UserResponse,
};
use super::tasks::ReviewRequest;
use crate::auth::middleware::{AdminUser, StaffUser, SuperAdminUser};
use crate::entities::Platform;
use crate::entities::dispute::DisputeStatus;
use crate::entities::order::OrderStatus;
use crate::entities::task::TaskStatus;
use crate::entities::transaction::{TransactionKind, TransactionStatus};
use crate::entities::user::{AccountStatus, Role};
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::maintenance::{self, MaintenanceReport};
use crate::services::{
    AuthService, DisputeService, OrderFilter, OrderOverview, OrderService, PageParams,
    Reconciliation, SettingService, TaskService, TransactionFilter, TransactionService,
    UserFilter, UserService,
};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the admin route group: `/admin/...`
///
/// Every route except `/auth/login` requires an admin-scope session; the
/// extractor on each handler sets the minimum role.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(admin_login))
        .route("/auth/me", get(admin_me))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/role", put(set_role))
        .route("/users/{id}/status", put(set_status))
        .route("/users/{id}/balance", post(adjust_balance))
        .route("/users/{id}/reconcile", get(reconcile))
        .route("/orders", get(list_orders))
        .route("/orders/statistics/overview", get(orders_overview))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/approve", post(approve_order))
        .route("/orders/{id}/reject", post(reject_order))
        .route("/orders/{id}/refund", post(refund_order))
        .route("/transactions", get(list_transactions))
        .route("/withdrawals/{id}/approve", post(approve_withdrawal))
        .route("/withdrawals/{id}/reject", post(reject_withdrawal))
        .route("/disputes", get(list_disputes))
        .route("/disputes/{id}", get(get_dispute).put(update_dispute))
        .route("/tasks", get(list_tasks))
        .route("/tasks/{id}/review", post(review_task))
        .route("/settings", get(list_settings))
        .route("/settings/{key}", put(update_setting))
        .route("/maintenance/run", post(run_maintenance))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UserQuery {
    offset: Option<u64>,
    limit: Option<u64>,
    search: Option<String>,
    role: Option<Role>,
    status: Option<AccountStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminOrderQuery {
    offset: Option<u64>,
    limit: Option<u64>,
    user_id: Option<Uuid>,
    status: Option<OrderStatus>,
    platform: Option<Platform>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminTransactionQuery {
    offset: Option<u64>,
    limit: Option<u64>,
    user_id: Option<Uuid>,
    kind: Option<TransactionKind>,
    status: Option<TransactionStatus>,
}

#[derive(Debug, Deserialize)]
struct AdminTaskQuery {
    offset: Option<u64>,
    limit: Option<u64>,
    status: Option<TaskStatus>,
    platform: Option<Platform>,
}

#[derive(Deserialize)]
struct SetRoleRequest {
    role: Role,
}

#[derive(Deserialize)]
struct SetStatusRequest {
    status: AccountStatus,
    reason: Option<String>,
}

#[derive(Deserialize)]
struct AdjustBalanceRequest {
    amount: i64,
    reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdjustmentResponse {
    transaction: TransactionResponse,
    balance: i64,
}

#[derive(Default, Deserialize)]
struct ReasonRequest {
    reason: Option<String>,
}

#[derive(Deserialize)]
struct UpdateDisputeRequest {
    status: DisputeStatus,
    resolution: Option<String>,
}

#[derive(Deserialize)]
struct UpdateSettingRequest {
    value: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MaintenanceResponse {
    sessions_purged: u64,
    users_recalculated: u64,
}

impl From<MaintenanceReport> for MaintenanceResponse {
    fn from(report: MaintenanceReport) -> Self {
        Self {
            sessions_purged: report.sessions_purged,
            users_recalculated: report.users_recalculated,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers: auth
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/admin/auth/login`
async fn admin_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let outcome = AuthService::admin_login(
        &state.db,
        &state.config,
        &body.email,
        &body.password,
        &client_info(&headers),
    )
    .await?;
    Ok(Json(outcome.into()))
}

/// `GET /api/admin/auth/me`
async fn admin_me(StaffUser(user): StaffUser) -> Json<UserResponse> {
    Json(user.into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers: users
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/admin/users`
async fn list_users(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    AppQuery(query): AppQuery<UserQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, AppError> {
    let page = UserService::list(
        &state.db,
        UserFilter {
            search: query.search,
            role: query.role,
            status: query.status,
        },
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `GET /api/admin/users/{id}`
async fn get_user(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(UserService::get(&state.db, id).await?.into()))
}

/// `PUT /api/admin/users/{id}/role`
async fn set_role(
    State(state): State<AppState>,
    SuperAdminUser(admin): SuperAdminUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<SetRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::set_role(&state.db, &admin, id, body.role).await?;
    Ok(Json(user.into()))
}

/// `PUT /api/admin/users/{id}/status`
async fn set_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<SetStatusRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::set_status(&state.db, &admin, id, body.status, body.reason).await?;
    Ok(Json(user.into()))
}

/// `POST /api/admin/users/{id}/balance`
async fn adjust_balance(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<AdjustBalanceRequest>,
) -> Result<Json<AdjustmentResponse>, AppError> {
    let (transaction, balance) =
        TransactionService::adjust(&state.db, id, body.amount, &body.reason, admin.id).await?;
    Ok(Json(AdjustmentResponse {
        transaction: transaction.into(),
        balance,
    }))
}

/// `GET /api/admin/users/{id}/reconcile`
async fn reconcile(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Reconciliation>, AppError> {
    Ok(Json(TransactionService::reconcile(&state.db, id).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers: orders
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/admin/orders`
async fn list_orders(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    AppQuery(query): AppQuery<AdminOrderQuery>,
) -> Result<Json<PaginatedResponse<OrderResponse>>, AppError> {
    let page = OrderService::list(
        &state.db,
        OrderFilter {
            user_id: query.user_id,
            status: query.status,
            platform: query.platform,
        },
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `GET /api/admin/orders/statistics/overview`
async fn orders_overview(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
) -> Result<Json<OrderOverview>, AppError> {
    Ok(Json(OrderService::overview(&state.db).await?))
}

/// `GET /api/admin/orders/{id}`
async fn get_order(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    Ok(Json(OrderService::get(&state.db, id).await?.into()))
}

/// `POST /api/admin/orders/{id}/approve`
async fn approve_order(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    Ok(Json(OrderService::approve(&state.db, staff.id, id).await?.into()))
}

/// `POST /api/admin/orders/{id}/reject`
async fn reject_order(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<ReasonRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let reason = body.reason.unwrap_or_default();
    Ok(Json(
        OrderService::reject(&state.db, staff.id, id, &reason)
            .await?
            .into(),
    ))
}

/// `POST /api/admin/orders/{id}/refund`
async fn refund_order(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    Ok(Json(OrderService::refund(&state.db, admin.id, id).await?.into()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers: money
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/admin/transactions`
async fn list_transactions(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    AppQuery(query): AppQuery<AdminTransactionQuery>,
) -> Result<Json<PaginatedResponse<TransactionResponse>>, AppError> {
    let page = TransactionService::list(
        &state.db,
        TransactionFilter {
            user_id: query.user_id,
            kind: query.kind,
            status: query.status,
        },
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `POST /api/admin/withdrawals/{id}/approve`
async fn approve_withdrawal(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<TransactionResponse>, AppError> {
    Ok(Json(
        TransactionService::approve_withdrawal(&state.db, id, admin.id)
            .await?
            .into(),
    ))
}

/// `POST /api/admin/withdrawals/{id}/reject`
async fn reject_withdrawal(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
    body: Option<AppJson<ReasonRequest>>,
) -> Result<Json<TransactionResponse>, AppError> {
    let AppJson(body) = body.unwrap_or_default();
    Ok(Json(
        TransactionService::reject_withdrawal(&state.db, id, admin.id, body.reason)
            .await?
            .into(),
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers: disputes and tasks
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/admin/disputes`
async fn list_disputes(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    AppQuery(query): AppQuery<DisputeQuery>,
) -> Result<Json<PaginatedResponse<DisputeResponse>>, AppError> {
    let page = DisputeService::list(
        &state.db,
        None,
        query.status,
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `GET /api/admin/disputes/{id}`
async fn get_dispute(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DisputeResponse>, AppError> {
    Ok(Json(DisputeService::get(&state.db, id).await?.into()))
}

/// `PUT /api/admin/disputes/{id}`
async fn update_dispute(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateDisputeRequest>,
) -> Result<Json<DisputeResponse>, AppError> {
    let dispute =
        DisputeService::update_status(&state.db, staff.id, id, body.status, body.resolution)
            .await?;
    Ok(Json(dispute.into()))
}

/// `GET /api/admin/tasks`
async fn list_tasks(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    AppQuery(query): AppQuery<AdminTaskQuery>,
) -> Result<Json<PaginatedResponse<TaskResponse>>, AppError> {
    let page = TaskService::list_all(
        &state.db,
        query.status,
        query.platform,
        PageParams::new(query.offset, query.limit),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page, Into::into)))
}

/// `POST /api/admin/tasks/{id}/review`
async fn review_task(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<ReviewRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = TaskService::review(&state.db, &staff, true, id, body.approve, body.reason).await?;
    Ok(Json(task.into()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers: platform
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/admin/settings`
async fn list_settings(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<SettingResponse>>, AppError> {
    let settings = SettingService::list(&state.db).await?;
    Ok(Json(settings.into_iter().map(Into::into).collect()))
}

/// `PUT /api/admin/settings/{key}`. Accepts strings, numbers and booleans.
async fn update_setting(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(key): AppPath<String>,
    AppJson(body): AppJson<UpdateSettingRequest>,
) -> Result<Json<SettingResponse>, AppError> {
    let value = match body.value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => {
            return Err(AppError::BadRequest(
                "Setting value must be a string, number or boolean.".to_string(),
            ));
        }
    };
    let setting = SettingService::update(&state.db, &key, &value, admin.id).await?;
    Ok(Json(setting.into()))
}

/// `POST /api/admin/maintenance/run`
async fn run_maintenance(
    State(state): State<AppState>,
    SuperAdminUser(_): SuperAdminUser,
) -> Result<Json<MaintenanceResponse>, AppError> {
    Ok(Json(maintenance::run_once(&state.db).await?.into()))
}
