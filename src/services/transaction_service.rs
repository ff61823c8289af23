use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use super::{Page, PageParams, SettingService, clean_reason};
use crate::entities::transaction::{self, TransactionKind, TransactionStatus};
use crate::entities::user;
use crate::error::AppError;

/// Upper bound for a single deposit, withdrawal or adjustment, in cents.
pub const MAX_SINGLE_AMOUNT: i64 = 100_000_000;

/// Non-zero and within [`MAX_SINGLE_AMOUNT`] in either direction.
const fn adjustment_in_range(amount: i64) -> bool {
    amount != 0 && amount.unsigned_abs() <= MAX_SINGLE_AMOUNT.unsigned_abs()
}

/// A ledger row about to be written together with its balance change.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub user_id: Uuid,
    pub kind: TransactionKind,
    /// Signed cents: credits positive, debits negative.
    pub amount: i64,
    pub status: TransactionStatus,
    pub order_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub description: Option<String>,
    pub payout_method: Option<String>,
    pub payout_destination: Option<String>,
}

impl LedgerEntry {
    #[must_use]
    pub const fn new(user_id: Uuid, kind: TransactionKind, amount: i64) -> Self {
        Self {
            user_id,
            kind,
            amount,
            status: TransactionStatus::Completed,
            order_id: None,
            task_id: None,
            description: None,
            payout_method: None,
            payout_destination: None,
        }
    }

    #[must_use]
    pub const fn for_order(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    #[must_use]
    pub const fn for_task(mut self, task_id: Uuid) -> Self {
        self.task_id = Some(task_id);
        self
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Payout details submitted with a withdrawal.
#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub amount: i64,
    pub method: String,
    pub destination: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub user_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
}

/// Stored balance compared against the ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub user_id: Uuid,
    pub stored_balance: i64,
    pub ledger_balance: i64,
    pub drift: i64,
    pub consistent: bool,
}

pub struct TransactionService;

impl TransactionService {
    /// Write a ledger row and move the user's balance by its amount.
    ///
    /// Call inside a database transaction. Debits only succeed while the balance
    /// covers them; a failed row leaves the balance untouched.
    pub async fn record<C: ConnectionTrait>(
        conn: &C,
        entry: LedgerEntry,
    ) -> Result<transaction::Model, AppError> {
        if entry.status.affects_balance() && entry.amount != 0 {
            Self::apply_balance_change(conn, entry.user_id, entry.amount).await?;
        }

        let now = Utc::now();
        let row = transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(entry.user_id),
            order_id: Set(entry.order_id),
            task_id: Set(entry.task_id),
            kind: Set(entry.kind),
            amount: Set(entry.amount),
            status: Set(entry.status),
            description: Set(entry.description),
            payout_method: Set(entry.payout_method),
            payout_destination: Set(entry.payout_destination),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(conn)
        .await?;

        tracing::debug!(
            user_id = %row.user_id,
            transaction_id = %row.id,
            kind = ?row.kind,
            amount = row.amount,
            "Ledger entry recorded"
        );
        Ok(row)
    }

    async fn apply_balance_change<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        amount: i64,
    ) -> Result<(), AppError> {
        let mut update = user::Entity::update_many()
            .col_expr(
                user::Column::Balance,
                Expr::col(user::Column::Balance).add(amount),
            )
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(user::Column::Id.eq(user_id));

        if amount < 0 {
            let required = amount
                .checked_neg()
                .ok_or_else(|| AppError::BadRequest("Insufficient balance.".to_string()))?;
            update = update.filter(user::Column::Balance.gte(required));
        }

        if update.exec(conn).await?.rows_affected == 0 {
            return Err(if amount < 0 {
                AppError::BadRequest("Insufficient balance.".to_string())
            } else {
                AppError::NotFound("User not found.".to_string())
            });
        }
        Ok(())
    }

    /// Current stored balance of a user.
    pub async fn balance<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> Result<i64, AppError> {
        user::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .map(|u| u.balance)
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
    }

    /// Credit a completed deposit. Returns the row and the new balance.
    pub async fn deposit(
        db: &DatabaseConnection,
        user_id: Uuid,
        amount: i64,
    ) -> Result<(transaction::Model, i64), AppError> {
        let min_deposit = SettingService::min_deposit(db).await?;
        if amount < min_deposit {
            return Err(AppError::BadRequest(format!(
                "Minimum deposit is {min_deposit} cents."
            )));
        }
        if amount > MAX_SINGLE_AMOUNT {
            return Err(AppError::BadRequest(format!(
                "Maximum deposit is {MAX_SINGLE_AMOUNT} cents."
            )));
        }

        let txn = db.begin().await?;
        let row = Self::record(
            &txn,
            LedgerEntry::new(user_id, TransactionKind::Deposit, amount).describe("Balance top-up"),
        )
        .await?;
        let balance = Self::balance(&txn, user_id).await?;
        txn.commit().await?;

        tracing::info!(user_id = %user_id, amount, balance, "Deposit completed");
        Ok((row, balance))
    }

    /// Hold funds for a payout pending operator approval.
    pub async fn withdraw(
        db: &DatabaseConnection,
        user_id: Uuid,
        request: WithdrawalRequest,
    ) -> Result<(transaction::Model, i64), AppError> {
        let mut errors = Vec::new();
        let min_withdrawal = SettingService::min_withdrawal(db).await?;
        if request.amount < min_withdrawal {
            errors.push(format!("Minimum withdrawal is {min_withdrawal} cents."));
        }
        if request.amount > MAX_SINGLE_AMOUNT {
            errors.push(format!("Maximum withdrawal is {MAX_SINGLE_AMOUNT} cents."));
        }
        let method = request.method.trim();
        if method.is_empty() || method.len() > 50 {
            errors.push("Payout method is required (at most 50 characters).".to_string());
        }
        let destination = request.destination.trim();
        if destination.is_empty() || destination.len() > 255 {
            errors.push("Payout destination is required (at most 255 characters).".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let mut entry = LedgerEntry::new(user_id, TransactionKind::Withdrawal, -request.amount)
            .describe("Withdrawal request");
        entry.status = TransactionStatus::Pending;
        entry.payout_method = Some(method.to_string());
        entry.payout_destination = Some(destination.to_string());

        let txn = db.begin().await?;
        let row = Self::record(&txn, entry).await?;
        let balance = Self::balance(&txn, user_id).await?;
        txn.commit().await?;

        tracing::info!(user_id = %user_id, amount = request.amount, "Withdrawal requested");
        Ok((row, balance))
    }

    async fn pending_withdrawal<C: ConnectionTrait>(
        conn: &C,
        transaction_id: Uuid,
    ) -> Result<transaction::Model, AppError> {
        transaction::Entity::find_by_id(transaction_id)
            .filter(transaction::Column::Kind.eq(TransactionKind::Withdrawal))
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Withdrawal not found.".to_string()))
    }

    /// Move a pending row to `next` if nobody else got there first.
    async fn settle<C: ConnectionTrait>(
        conn: &C,
        row: &transaction::Model,
        next: TransactionStatus,
        description: Option<String>,
    ) -> Result<(), AppError> {
        if !row.status.can_transition_to(next) {
            return Err(AppError::invalid_transition("transaction", row.status, next));
        }

        let mut update = transaction::Entity::update_many()
            .col_expr(transaction::Column::Status, Expr::value(next))
            .col_expr(
                transaction::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(transaction::Column::Id.eq(row.id))
            .filter(transaction::Column::Status.eq(row.status));
        if let Some(description) = description {
            update = update.col_expr(transaction::Column::Description, Expr::value(description));
        }

        if update.exec(conn).await?.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Transaction was modified concurrently.".to_string(),
            ));
        }
        Ok(())
    }

    /// Mark a held withdrawal as paid out.
    pub async fn approve_withdrawal(
        db: &DatabaseConnection,
        transaction_id: Uuid,
        admin_id: Uuid,
    ) -> Result<transaction::Model, AppError> {
        let txn = db.begin().await?;
        let row = Self::pending_withdrawal(&txn, transaction_id).await?;
        Self::settle(&txn, &row, TransactionStatus::Completed, None).await?;
        let row = Self::pending_withdrawal(&txn, transaction_id).await?;
        txn.commit().await?;

        tracing::info!(transaction_id = %row.id, admin_id = %admin_id, "Withdrawal approved");
        Ok(row)
    }

    /// Fail a held withdrawal and release the funds back to the user.
    pub async fn reject_withdrawal(
        db: &DatabaseConnection,
        transaction_id: Uuid,
        admin_id: Uuid,
        reason: Option<String>,
    ) -> Result<transaction::Model, AppError> {
        let description =
            clean_reason(reason.as_deref())?.map(|r| format!("Withdrawal rejected: {r}"));
        let txn = db.begin().await?;
        let row = Self::pending_withdrawal(&txn, transaction_id).await?;
        Self::settle(&txn, &row, TransactionStatus::Failed, description).await?;
        Self::apply_balance_change(&txn, row.user_id, -row.amount).await?;
        let row = Self::pending_withdrawal(&txn, transaction_id).await?;
        txn.commit().await?;

        tracing::info!(transaction_id = %row.id, admin_id = %admin_id, "Withdrawal rejected");
        Ok(row)
    }

    /// Operator correction. The resulting balance may not go negative.
    pub async fn adjust(
        db: &DatabaseConnection,
        user_id: Uuid,
        amount: i64,
        reason: &str,
        admin_id: Uuid,
    ) -> Result<(transaction::Model, i64), AppError> {
        let mut errors = Vec::new();
        if !adjustment_in_range(amount) {
            errors.push(format!(
                "Amount must be non-zero and at most {MAX_SINGLE_AMOUNT} cents either way."
            ));
        }
        let reason = match clean_reason(Some(reason)) {
            Ok(Some(reason)) => reason,
            Ok(None) => {
                errors.push("Reason is required.".to_string());
                String::new()
            }
            Err(AppError::Validation(mut details)) => {
                errors.append(&mut details);
                String::new()
            }
            Err(err) => return Err(err),
        };
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let txn = db.begin().await?;
        Self::balance(&txn, user_id).await?;
        let row = Self::record(
            &txn,
            LedgerEntry::new(user_id, TransactionKind::Adjustment, amount).describe(reason),
        )
        .await
        .map_err(|err| match err {
            AppError::BadRequest(_) => AppError::BadRequest(
                "Adjustment would make the balance negative.".to_string(),
            ),
            other => other,
        })?;
        let balance = Self::balance(&txn, user_id).await?;
        txn.commit().await?;

        tracing::info!(
            user_id = %user_id,
            admin_id = %admin_id,
            amount,
            balance,
            "Balance adjusted"
        );
        Ok((row, balance))
    }

    pub async fn list(
        db: &DatabaseConnection,
        filter: TransactionFilter,
        page: PageParams,
    ) -> Result<Page<transaction::Model>, AppError> {
        let mut query = transaction::Entity::find();
        if let Some(user_id) = filter.user_id {
            query = query.filter(transaction::Column::UserId.eq(user_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(transaction::Column::Kind.eq(kind));
        }
        if let Some(status) = filter.status {
            query = query.filter(transaction::Column::Status.eq(status));
        }

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(transaction::Column::CreatedAt)
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

    /// Sum of a user's ledger rows that count towards the balance.
    pub async fn ledger_balance<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<i64, AppError> {
        let amounts: Vec<i64> = transaction::Entity::find()
            .select_only()
            .column(transaction::Column::Amount)
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::Status.ne(TransactionStatus::Failed))
            .into_tuple()
            .all(conn)
            .await?;
        Ok(amounts.into_iter().sum())
    }

    pub async fn reconcile(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<Reconciliation, AppError> {
        let stored_balance = Self::balance(db, user_id).await?;
        let ledger_balance = Self::ledger_balance(db, user_id).await?;
        let drift = stored_balance - ledger_balance;

        if drift != 0 {
            tracing::warn!(
                user_id = %user_id,
                stored_balance,
                ledger_balance,
                "Balance drift detected"
            );
        }

        Ok(Reconciliation {
            user_id,
            stored_balance,
            ledger_balance,
            drift,
            consistent: drift == 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_entry_builder() {
        let user_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let entry = LedgerEntry::new(user_id, TransactionKind::Refund, 250)
            .for_order(order_id)
            .describe("Order cancelled");

        assert_eq!(entry.status, TransactionStatus::Completed);
        assert_eq!(entry.order_id, Some(order_id));
        assert_eq!(entry.task_id, None);
        assert_eq!(entry.description.as_deref(), Some("Order cancelled"));
    }

    #[test]
    fn adjustment_bounds() {
        assert!(adjustment_in_range(-MAX_SINGLE_AMOUNT));
        assert!(adjustment_in_range(MAX_SINGLE_AMOUNT));
        assert!(!adjustment_in_range(0));
        assert!(!adjustment_in_range(MAX_SINGLE_AMOUNT + 1));
        assert!(!adjustment_in_range(i64::MIN));
        assert!(!adjustment_in_range(i64::MAX));
    }
}
