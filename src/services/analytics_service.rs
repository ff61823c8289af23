use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, Iterable, QueryFilter, QuerySelect};
use serde::Serialize;
use uuid::Uuid;

use super::TransactionService;
use crate::entities::order_statistic::Timeframe;
use crate::entities::transaction::{self, TransactionKind, TransactionStatus};
use crate::error::AppError;

/// Closing balance of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub net_change: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindTotal {
    pub kind: TransactionKind,
    pub count: u64,
    pub total: i64,
}

/// Withdrawal amounts are reported as positive cents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalSummary {
    pub pending_count: u64,
    pub pending_total: i64,
    pub completed_count: u64,
    pub completed_total: i64,
    pub failed_count: u64,
    pub failed_total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundSummary {
    pub count: u64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub timeframe: Timeframe,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Completed rows per kind.
    pub by_kind: Vec<KindTotal>,
    pub withdrawals: WithdrawalSummary,
    pub refunds: RefundSummary,
    /// Net effect of every non-failed row in the window.
    pub net_change: i64,
}

/// First day of a window ending today, inclusive.
fn window_start(today: NaiveDate, timeframe: Timeframe) -> NaiveDate {
    today - Duration::days(timeframe.days() - 1)
}

/// Daily buckets from `start` to `today`, walking backwards from the current balance.
#[must_use]
pub fn build_balance_history(
    start: NaiveDate,
    today: NaiveDate,
    current_balance: i64,
    rows: &[(DateTime<Utc>, i64)],
) -> Vec<BalancePoint> {
    let mut net_by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for (at, amount) in rows {
        let day = at.date_naive();
        if day >= start && day <= today {
            *net_by_day.entry(day).or_default() += amount;
        }
    }

    let mut points = Vec::new();
    let mut closing = current_balance;
    let mut day = today;
    while day >= start {
        let net_change = net_by_day.get(&day).copied().unwrap_or_default();
        points.push(BalancePoint {
            date: day,
            net_change,
            balance: closing,
        });
        closing -= net_change;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    points.reverse();
    points
}

/// Fold ledger rows into per-kind, withdrawal and refund aggregates.
#[must_use]
pub fn summarize(
    rows: &[(TransactionKind, TransactionStatus, i64)],
) -> (Vec<KindTotal>, WithdrawalSummary, RefundSummary, i64) {
    let mut by_kind: Vec<KindTotal> = TransactionKind::iter()
        .map(|kind| KindTotal {
            kind,
            count: 0,
            total: 0,
        })
        .collect();
    let mut withdrawals = WithdrawalSummary::default();
    let mut refunds = RefundSummary::default();
    let mut net_change = 0;

    for &(kind, status, amount) in rows {
        if status.affects_balance() {
            net_change += amount;
        }
        if status == TransactionStatus::Completed {
            if let Some(entry) = by_kind.iter_mut().find(|k| k.kind == kind) {
                entry.count += 1;
                entry.total += amount;
            }
        }
        match kind {
            TransactionKind::Withdrawal => {
                let (count, total) = match status {
                    TransactionStatus::Pending => {
                        (&mut withdrawals.pending_count, &mut withdrawals.pending_total)
                    }
                    TransactionStatus::Completed => (
                        &mut withdrawals.completed_count,
                        &mut withdrawals.completed_total,
                    ),
                    TransactionStatus::Failed => {
                        (&mut withdrawals.failed_count, &mut withdrawals.failed_total)
                    }
                };
                *count += 1;
                *total += amount.abs();
            }
            TransactionKind::Refund if status == TransactionStatus::Completed => {
                refunds.count += 1;
                refunds.total += amount;
            }
            _ => {}
        }
    }

    (by_kind, withdrawals, refunds, net_change)
}

pub struct AnalyticsService;

impl AnalyticsService {
    async fn rows_since(
        db: &DatabaseConnection,
        user_id: Uuid,
        start: NaiveDate,
    ) -> Result<Vec<(TransactionKind, TransactionStatus, i64, DateTimeWithTimeZone)>, AppError>
    {
        let since: DateTimeWithTimeZone = start
            .and_hms_opt(0, 0, 0)
            .map_or_else(Utc::now, |midnight| Utc.from_utc_datetime(&midnight))
            .into();
        Ok(transaction::Entity::find()
            .select_only()
            .column(transaction::Column::Kind)
            .column(transaction::Column::Status)
            .column(transaction::Column::Amount)
            .column(transaction::Column::CreatedAt)
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::CreatedAt.gte(since))
            .into_tuple()
            .all(db)
            .await?)
    }

    pub async fn balance_history(
        db: &DatabaseConnection,
        user_id: Uuid,
        timeframe: Timeframe,
    ) -> Result<Vec<BalancePoint>, AppError> {
        let today = Utc::now().date_naive();
        let start = window_start(today, timeframe);

        let current_balance = TransactionService::balance(db, user_id).await?;
        let rows: Vec<(DateTime<Utc>, i64)> = Self::rows_since(db, user_id, start)
            .await?
            .into_iter()
            .filter(|(_, status, _, _)| status.affects_balance())
            .map(|(_, _, amount, at)| (at.with_timezone(&Utc), amount))
            .collect();

        Ok(build_balance_history(start, today, current_balance, &rows))
    }

    pub async fn transaction_summary(
        db: &DatabaseConnection,
        user_id: Uuid,
        timeframe: Timeframe,
    ) -> Result<TransactionSummary, AppError> {
        let today = Utc::now().date_naive();
        let start = window_start(today, timeframe);

        let rows: Vec<(TransactionKind, TransactionStatus, i64)> =
            Self::rows_since(db, user_id, start)
                .await?
                .into_iter()
                .map(|(kind, status, amount, _)| (kind, status, amount))
                .collect();
        let (by_kind, withdrawals, refunds, net_change) = summarize(&rows);

        Ok(TransactionSummary {
            timeframe,
            from: start,
            to: today,
            by_kind,
            withdrawals,
            refunds,
            net_change,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn history_walks_back_from_current_balance() {
        let rows = [
            (at(2026, 3, 2, 9), 1000),
            (at(2026, 3, 2, 18), -200),
            (at(2026, 3, 4, 12), 500),
        ];
        let points = build_balance_history(day(2026, 3, 1), day(2026, 3, 4), 1300, &rows);

        let balances: Vec<i64> = points.iter().map(|p| p.balance).collect();
        assert_eq!(balances, vec![0, 800, 800, 1300]);
        assert_eq!(points[1].net_change, 800);
        assert_eq!(points.first().map(|p| p.date), Some(day(2026, 3, 1)));
    }

    #[test]
    fn history_has_one_point_per_day() {
        let points = build_balance_history(day(2026, 1, 1), day(2026, 1, 30), 0, &[]);
        assert_eq!(points.len(), 30);
        assert!(points.iter().all(|p| p.net_change == 0 && p.balance == 0));
    }

    #[test]
    fn window_start_is_inclusive() {
        assert_eq!(window_start(day(2026, 3, 30), Timeframe::Week), day(2026, 3, 24));
        assert_eq!(window_start(day(2026, 3, 30), Timeframe::Month), day(2026, 3, 1));
    }

    #[test]
    fn three_ten_dollar_deposits() {
        let deposit = (TransactionKind::Deposit, TransactionStatus::Completed, 1000);
        let (by_kind, _, _, net) = summarize(&[deposit, deposit, deposit]);

        let deposits = by_kind.iter().find(|k| k.kind == TransactionKind::Deposit);
        assert_eq!(deposits.map(|k| (k.count, k.total)), Some((3, 3000)));
        assert_eq!(net, 3000);
    }

    #[test]
    fn withdrawals_are_split_by_status() {
        let rows = [
            (TransactionKind::Withdrawal, TransactionStatus::Pending, -700),
            (TransactionKind::Withdrawal, TransactionStatus::Completed, -500),
            (TransactionKind::Withdrawal, TransactionStatus::Failed, -900),
            (TransactionKind::Refund, TransactionStatus::Completed, 300),
        ];
        let (_, withdrawals, refunds, net) = summarize(&rows);

        assert_eq!(withdrawals.pending_total, 700);
        assert_eq!(withdrawals.completed_total, 500);
        assert_eq!(withdrawals.failed_count, 1);
        assert_eq!(refunds.total, 300);
        assert_eq!(net, -700 - 500 + 300);
    }
}
