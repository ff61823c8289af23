use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Iterable, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::Platform;
use crate::entities::order::{self, OrderStatus};
use crate::entities::order_statistic::{self, Timeframe};
use crate::error::AppError;

/// The order columns a rollup needs.
#[derive(Debug, Clone, Copy)]
pub struct OrderFacts {
    pub platform: Platform,
    pub status: OrderStatus,
    pub amount: i64,
    pub unit_price: i64,
    pub quantity: i32,
    pub remaining_count: i32,
    pub created_at: DateTime<Utc>,
}

impl OrderFacts {
    /// What the buyer ended up paying after refunds.
    #[must_use]
    pub fn spent(&self) -> i64 {
        match self.status {
            OrderStatus::Cancelled | OrderStatus::Failed => 0,
            OrderStatus::Refunded => {
                i64::from(self.quantity - self.remaining_count) * self.unit_price
            }
            _ => self.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rollup {
    pub total_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    pub total_spent: i64,
    pub total_quantity: i64,
    pub delivered_quantity: i64,
}

/// Aggregate the orders on `platform` placed at or after `since`.
#[must_use]
pub fn rollup(orders: &[OrderFacts], platform: Platform, since: DateTime<Utc>) -> Rollup {
    orders
        .iter()
        .filter(|o| o.platform == platform && o.created_at >= since)
        .fold(Rollup::default(), |mut acc, o| {
            acc.total_orders += 1;
            match o.status {
                OrderStatus::Completed => acc.completed_orders += 1,
                OrderStatus::Cancelled => acc.cancelled_orders += 1,
                _ => {}
            }
            acc.total_spent += o.spent();
            acc.total_quantity += i64::from(o.quantity);
            acc.delivered_quantity += i64::from(o.quantity - o.remaining_count);
            acc
        })
}

pub struct OrderStatisticsService;

impl OrderStatisticsService {
    /// Rebuild every platform and timeframe rollup for one user.
    pub async fn recalculate_for_user(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<Vec<order_statistic::Model>, AppError> {
        let now = Utc::now();
        let oldest: DateTimeWithTimeZone = (now - Timeframe::Year.duration()).into();

        let rows: Vec<(Platform, OrderStatus, i64, i64, i32, i32, DateTimeWithTimeZone)> =
            order::Entity::find()
                .select_only()
                .column(order::Column::Platform)
                .column(order::Column::Status)
                .column(order::Column::Amount)
                .column(order::Column::UnitPrice)
                .column(order::Column::Quantity)
                .column(order::Column::RemainingCount)
                .column(order::Column::CreatedAt)
                .filter(order::Column::UserId.eq(user_id))
                .filter(order::Column::CreatedAt.gte(oldest))
                .into_tuple()
                .all(db)
                .await?;

        let orders: Vec<OrderFacts> = rows
            .into_iter()
            .map(
                |(platform, status, amount, unit_price, quantity, remaining_count, created_at)| {
                    OrderFacts {
                        platform,
                        status,
                        amount,
                        unit_price,
                        quantity,
                        remaining_count,
                        created_at: created_at.with_timezone(&Utc),
                    }
                },
            )
            .collect();

        let rows: Vec<order_statistic::ActiveModel> = Platform::iter()
            .flat_map(|platform| Timeframe::ALL.map(|timeframe| (platform, timeframe)))
            .map(|(platform, timeframe)| {
                let figures = rollup(&orders, platform, now - timeframe.duration());
                order_statistic::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    platform: Set(platform),
                    timeframe: Set(timeframe),
                    total_orders: Set(figures.total_orders),
                    completed_orders: Set(figures.completed_orders),
                    cancelled_orders: Set(figures.cancelled_orders),
                    total_spent: Set(figures.total_spent),
                    total_quantity: Set(figures.total_quantity),
                    delivered_quantity: Set(figures.delivered_quantity),
                    calculated_at: Set(now.into()),
                }
            })
            .collect();

        // Concurrent recalculations for one user converge on the unique key.
        order_statistic::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    order_statistic::Column::UserId,
                    order_statistic::Column::Platform,
                    order_statistic::Column::Timeframe,
                ])
                .update_columns([
                    order_statistic::Column::TotalOrders,
                    order_statistic::Column::CompletedOrders,
                    order_statistic::Column::CancelledOrders,
                    order_statistic::Column::TotalSpent,
                    order_statistic::Column::TotalQuantity,
                    order_statistic::Column::DeliveredQuantity,
                    order_statistic::Column::CalculatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        let saved = Self::list(db, user_id, None).await?;

        tracing::debug!(user_id = %user_id, rows = saved.len(), "Order statistics recalculated");
        Ok(saved)
    }

    /// Refresh rollups for every user who has placed an order. Returns the user count.
    pub async fn recalculate_all(db: &DatabaseConnection) -> Result<u64, AppError> {
        let user_ids: Vec<Uuid> = order::Entity::find()
            .select_only()
            .column(order::Column::UserId)
            .distinct()
            .into_tuple()
            .all(db)
            .await?;

        let mut refreshed = 0;
        for user_id in user_ids {
            Self::recalculate_for_user(db, user_id).await?;
            refreshed += 1;
        }
        Ok(refreshed)
    }

    pub async fn list(
        db: &DatabaseConnection,
        user_id: Uuid,
        timeframe: Option<Timeframe>,
    ) -> Result<Vec<order_statistic::Model>, AppError> {
        let mut query =
            order_statistic::Entity::find().filter(order_statistic::Column::UserId.eq(user_id));
        if let Some(timeframe) = timeframe {
            query = query.filter(order_statistic::Column::Timeframe.eq(timeframe));
        }
        let mut rows = query.all(db).await?;
        rows.sort_by_key(|row| (row.platform, row.timeframe));
        Ok(rows)
    }
}
