use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    Iterable, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use super::{
    LedgerEntry, Page, PageParams, TaskService, TransactionService, clean_reason, pricing,
};
use crate::entities::Platform;
use crate::entities::order::{self, OrderStatus, ServiceType};
use crate::entities::task::{self, TaskStatus};
use crate::entities::transaction::{self, TransactionKind, TransactionStatus};
use crate::entities::user::{self, UserMode};
use crate::error::AppError;

pub const MAX_QUANTITY: i64 = 100_000;
pub const MAX_TARGET_URL_LEN: usize = 2048;

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub platform: Platform,
    pub service_type: ServiceType,
    pub target_url: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub platform: Option<Platform>,
}

/// Platform-wide order figures for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOverview {
    pub total_orders: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_platform: BTreeMap<String, u64>,
    /// Order payments minus refunds, in cents.
    pub revenue: i64,
    pub total_quantity: i64,
    pub delivered_quantity: i64,
}

/// Check that `raw` is an http(s) URL on one of the platform's hosts.
///
/// # Errors
///
/// Returns a user-facing message when the URL is rejected.
pub fn validate_target_url(platform: Platform, raw: &str) -> Result<String, String> {
    let url = raw.trim();
    if url.is_empty() || url.len() > MAX_TARGET_URL_LEN {
        return Err(format!(
            "Target URL is required (at most {MAX_TARGET_URL_LEN} characters)."
        ));
    }

    let parsed = Url::parse(url).map_err(|_| "Target URL is not a valid URL.".to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err("Target URL must start with http:// or https://.".to_string());
    }

    let host = parsed
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
        .unwrap_or_default();

    if platform.hosts().contains(&host.as_str()) {
        Ok(url.to_string())
    } else {
        Err(format!(
            "Target URL must point to {}.",
            platform.hosts().first().copied().unwrap_or_default()
        ))
    }
}

pub struct OrderService;

impl OrderService {
    /// Place an order and pay for it from the balance.
    pub async fn create(
        db: &DatabaseConnection,
        user: &user::Model,
        input: CreateOrder,
    ) -> Result<order::Model, AppError> {
        if user.mode != UserMode::TaskGiver {
            return Err(AppError::Forbidden(
                "Switch to task-giver mode to place orders.".to_string(),
            ));
        }

        let rate = pricing::quote(input.platform, input.service_type).ok_or_else(|| {
            AppError::BadRequest(format!(
                "{:?} {:?} is not offered.",
                input.platform, input.service_type
            ))
        })?;

        let mut errors = Vec::new();
        if !(1..=MAX_QUANTITY).contains(&input.quantity) {
            errors.push(format!("Quantity must be between 1 and {MAX_QUANTITY}."));
        }
        let target_url = match validate_target_url(input.platform, &input.target_url) {
            Ok(url) => url,
            Err(message) => {
                errors.push(message);
                String::new()
            }
        };
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let quantity = i32::try_from(input.quantity)
            .map_err(|_| AppError::BadRequest("Quantity is out of range.".to_string()))?;
        let amount = input.quantity * rate.unit_price;
        let now = Utc::now();

        let txn = db.begin().await?;
        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            platform: Set(input.platform),
            service_type: Set(input.service_type),
            target_url: Set(target_url),
            quantity: Set(quantity),
            remaining_count: Set(quantity),
            unit_price: Set(rate.unit_price),
            amount: Set(amount),
            status: Set(OrderStatus::Pending),
            rejection_reason: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            completed_at: Set(None),
        }
        .insert(&txn)
        .await?;

        TransactionService::record(
            &txn,
            LedgerEntry::new(user.id, TransactionKind::OrderPayment, -amount)
                .for_order(order.id)
                .describe(format!(
                    "{} {:?} on {:?}",
                    order.quantity, order.service_type, order.platform
                )),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(
            user_id = %user.id,
            order_id = %order.id,
            amount,
            quantity = order.quantity,
            "Order created"
        );
        Ok(order)
    }

    pub async fn get<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
    ) -> Result<order::Model, AppError> {
        order::Entity::find_by_id(order_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found.".to_string()))
    }

    /// Fetch an order owned by `user_id`; other users' orders are reported missing.
    pub async fn get_owned<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<order::Model, AppError> {
        let order = Self::get(conn, order_id).await?;
        if order.user_id != user_id {
            return Err(AppError::NotFound("Order not found.".to_string()));
        }
        Ok(order)
    }

    pub async fn list(
        db: &DatabaseConnection,
        filter: OrderFilter,
        page: PageParams,
    ) -> Result<Page<order::Model>, AppError> {
        let mut query = order::Entity::find();
        if let Some(user_id) = filter.user_id {
            query = query.filter(order::Column::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(platform) = filter.platform {
            query = query.filter(order::Column::Platform.eq(platform));
        }

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(order::Column::CreatedAt)
            .offset(page.offset)
            .limit(page.limit)
            .all(db)
            .await?;

        Ok(Page {
            items,
            total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    /// Move an order to `next`, guarded by the transition table and by the status
    /// it was read with.
    pub async fn set_status<C: ConnectionTrait>(
        conn: &C,
        order: &order::Model,
        next: OrderStatus,
        reason: Option<String>,
    ) -> Result<order::Model, AppError> {
        if !order.status.can_transition_to(next) {
            return Err(AppError::invalid_transition("order", order.status, next));
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let mut update = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(next))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(order.id))
            .filter(order::Column::Status.eq(order.status));
        if next.is_terminal() {
            update = update.col_expr(order::Column::CompletedAt, Expr::value(now));
        }
        if let Some(reason) = reason {
            update = update.col_expr(order::Column::RejectionReason, Expr::value(reason));
        }

        if update.exec(conn).await?.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Order was modified concurrently.".to_string(),
            ));
        }

        tracing::info!(
            order_id = %order.id,
            from = ?order.status,
            to = ?next,
            "Order status changed"
        );
        Self::get(conn, order.id).await
    }

    /// Owner withdraws a pending order and gets the full amount back.
    pub async fn cancel(
        db: &DatabaseConnection,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<order::Model, AppError> {
        let txn = db.begin().await?;
        let order = Self::get_owned(&txn, user_id, order_id).await?;
        let order = Self::set_status(&txn, &order, OrderStatus::Cancelled, None).await?;
        Self::refund_to_owner(&txn, &order, order.amount, "Order cancelled").await?;
        txn.commit().await?;
        Ok(order)
    }

    /// Accept a pending order and publish its first batch of tasks.
    pub async fn approve(
        db: &DatabaseConnection,
        admin_id: Uuid,
        order_id: Uuid,
    ) -> Result<order::Model, AppError> {
        let txn = db.begin().await?;
        let order = Self::get(&txn, order_id).await?;
        let order = Self::set_status(&txn, &order, OrderStatus::Processing, None).await?;
        let published = TaskService::replenish(&txn, &order).await?;
        txn.commit().await?;

        tracing::info!(admin_id = %admin_id, order_id = %order.id, published, "Order approved");
        Ok(order)
    }

    /// Decline a pending order with a reason and refund it in full.
    pub async fn reject(
        db: &DatabaseConnection,
        admin_id: Uuid,
        order_id: Uuid,
        reason: &str,
    ) -> Result<order::Model, AppError> {
        let Some(reason) = clean_reason(Some(reason))? else {
            return Err(AppError::Validation(vec![
                "A rejection reason is required.".to_string(),
            ]));
        };

        let txn = db.begin().await?;
        let order = Self::get(&txn, order_id).await?;
        let order = Self::set_status(&txn, &order, OrderStatus::Failed, Some(reason)).await?;
        Self::refund_to_owner(&txn, &order, order.amount, "Order rejected").await?;
        txn.commit().await?;

        tracing::info!(admin_id = %admin_id, order_id = %order.id, "Order rejected");
        Ok(order)
    }

    /// Stop a processing order and refund the undelivered units.
    pub async fn refund(
        db: &DatabaseConnection,
        admin_id: Uuid,
        order_id: Uuid,
    ) -> Result<order::Model, AppError> {
        let txn = db.begin().await?;
        let order = Self::get(&txn, order_id).await?;
        let order = Self::set_status(&txn, &order, OrderStatus::Refunded, None).await?;

        task::Entity::delete_many()
            .filter(task::Column::OrderId.eq(order.id))
            .filter(task::Column::Status.eq(TaskStatus::Available))
            .exec(&txn)
            .await?;

        let amount = i64::from(order.remaining_count) * order.unit_price;
        Self::refund_to_owner(&txn, &order, amount, "Undelivered units refunded").await?;
        txn.commit().await?;

        tracing::info!(admin_id = %admin_id, order_id = %order.id, amount, "Order refunded");
        Ok(order)
    }

    async fn refund_to_owner<C: ConnectionTrait>(
        conn: &C,
        order: &order::Model,
        amount: i64,
        description: &str,
    ) -> Result<(), AppError> {
        if amount <= 0 {
            return Ok(());
        }
        TransactionService::record(
            conn,
            LedgerEntry::new(order.user_id, TransactionKind::Refund, amount)
                .for_order(order.id)
                .describe(description),
        )
        .await?;
        Ok(())
    }

    /// Count one delivered unit; completes the order when nothing remains.
    pub async fn record_delivery<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
    ) -> Result<order::Model, AppError> {
        let order = Self::get(conn, order_id).await?;
        if order.status != OrderStatus::Processing {
            return Ok(order);
        }

        order::Entity::update_many()
            .col_expr(
                order::Column::RemainingCount,
                Expr::col(order::Column::RemainingCount).sub(1),
            )
            .col_expr(
                order::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::RemainingCount.gt(0))
            .exec(conn)
            .await?;

        let order = Self::get(conn, order_id).await?;
        if order.remaining_count == 0 {
            return Self::set_status(conn, &order, OrderStatus::Completed, None).await;
        }
        Ok(order)
    }

    pub async fn overview(db: &DatabaseConnection) -> Result<OrderOverview, AppError> {
        let rows: Vec<(OrderStatus, Platform, i32, i32)> = order::Entity::find()
            .select_only()
            .column(order::Column::Status)
            .column(order::Column::Platform)
            .column(order::Column::Quantity)
            .column(order::Column::RemainingCount)
            .into_tuple()
            .all(db)
            .await?;

        let mut by_status: BTreeMap<String, u64> =
            OrderStatus::iter().map(|s| (s.to_value(), 0)).collect();
        let mut by_platform: BTreeMap<String, u64> =
            Platform::iter().map(|p| (p.to_value(), 0)).collect();
        let mut total_quantity = 0_i64;
        let mut delivered_quantity = 0_i64;

        for (status, platform, quantity, remaining) in &rows {
            *by_status.entry(status.to_value()).or_default() += 1;
            *by_platform.entry(platform.to_value()).or_default() += 1;
            total_quantity += i64::from(*quantity);
            delivered_quantity += i64::from(quantity - remaining);
        }

        let ledger: Vec<i64> = transaction::Entity::find()
            .select_only()
            .column(transaction::Column::Amount)
            .filter(
                transaction::Column::Kind
                    .is_in([TransactionKind::OrderPayment, TransactionKind::Refund]),
            )
            .filter(transaction::Column::OrderId.is_not_null())
            .filter(transaction::Column::Status.ne(TransactionStatus::Failed))
            .into_tuple()
            .all(db)
            .await?;
        let revenue = -ledger.into_iter().sum::<i64>();

        Ok(OrderOverview {
            total_orders: u64::try_from(rows.len()).unwrap_or_default(),
            by_status,
            by_platform,
            revenue,
            total_quantity,
            delivered_quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_platform_hosts() {
        assert!(
            validate_target_url(Platform::Instagram, "https://www.instagram.com/p/abc/").is_ok()
        );
        assert!(validate_target_url(Platform::Youtube, "https://youtu.be/dQw4w9WgXcQ").is_ok());
        assert!(
            validate_target_url(Platform::Youtube, "http://m.youtube.com:443/watch?v=x").is_ok()
        );
    }

    #[test]
    fn rejects_foreign_hosts_and_schemes() {
        assert!(validate_target_url(Platform::Instagram, "https://youtube.com/watch?v=x").is_err());
        assert!(validate_target_url(Platform::Youtube, "ftp://youtube.com/x").is_err());
        assert!(validate_target_url(Platform::Youtube, "youtube.com/x").is_err());
        assert!(
            validate_target_url(Platform::Instagram, "https://instagram.com.evil.io/p").is_err()
        );
        assert!(validate_target_url(Platform::Instagram, "   ").is_err());
    }

    #[test]
    fn long_urls_are_bounded_by_the_limit() {
        let long = format!("https://instagram.com/p/{}", "a".repeat(600));
        assert!(validate_target_url(Platform::Instagram, &long).is_ok());
        let too_long = format!("https://instagram.com/p/{}", "a".repeat(MAX_TARGET_URL_LEN));
        assert!(validate_target_url(Platform::Instagram, &too_long).is_err());
    }

    #[test]
    fn host_match_ignores_case_and_trailing_dot() {
        assert!(validate_target_url(Platform::Instagram, "HTTPS://Instagram.com/p/x").is_ok());
        assert!(validate_target_url(Platform::Instagram, "https://instagram.com./p").is_ok());
    }

    #[test]
    fn rejects_malformed_ports_and_userinfo_tricks() {
        assert!(validate_target_url(Platform::Youtube, "https://youtube.com:abc/").is_err());
        assert!(
            validate_target_url(Platform::Instagram, "https://instagram.com@evil.io/p").is_err()
        );
    }
}
