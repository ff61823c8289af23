use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "order_payment")]
    OrderPayment,
    #[sea_orm(string_value = "task_earning")]
    TaskEarning,
    #[sea_orm(string_value = "refund")]
    Refund,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl TransactionStatus {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed)
        )
    }

    /// Whether a row in this status counts towards the user's balance.
    #[must_use]
    pub const fn affects_balance(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Ledger entry. `amount` is signed: credits are positive, debits negative.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub kind: TransactionKind,
    pub amount: i64,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub payout_method: Option<String>,
    pub payout_destination: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::task::Entity",
        from = "Column::TaskId",
        to = "super::task::Column::Id"
    )]
    Task,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_rows_change_status() {
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Completed));
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Failed));
        assert!(!TransactionStatus::Completed.can_transition_to(TransactionStatus::Failed));
        assert!(!TransactionStatus::Failed.can_transition_to(TransactionStatus::Completed));
    }

    #[test]
    fn failed_rows_do_not_count() {
        assert!(TransactionStatus::Pending.affects_balance());
        assert!(TransactionStatus::Completed.affects_balance());
        assert!(!TransactionStatus::Failed.affects_balance());
    }
}
