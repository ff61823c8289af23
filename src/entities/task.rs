use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::platform::Platform;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "follow")]
    Follow,
    #[sea_orm(string_value = "watch")]
    Watch,
    #[sea_orm(string_value = "subscribe")]
    Subscribe,
}

/// Task lifecycle: `available → in_progress → completed → approved | rejected`.
/// An assignee may hand an in-progress task back to the pool.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl TaskStatus {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Available, Self::InProgress)
                | (Self::InProgress, Self::Completed | Self::Available)
                | (Self::Completed, Self::Approved | Self::Rejected)
        )
    }

    /// Statuses that still occupy a slot in an order's task pool.
    pub const OPEN: [Self; 3] = [Self::Available, Self::InProgress, Self::Completed];
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub social_account_id: Option<Uuid>,
    pub platform: Platform,
    pub task_type: TaskType,
    pub target_url: String,
    /// Reward in cents credited to the assignee on approval.
    pub reward: i64,
    pub status: TaskStatus,
    pub proof: Option<String>,
    pub rejection_reason: Option<String>,
    pub claimed_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssigneeId",
        to = "super::user::Column::Id"
    )]
    Assignee,
    #[sea_orm(
        belongs_to = "super::social_account::Entity",
        from = "Column::SocialAccountId",
        to = "super::social_account::Column::Id"
    )]
    SocialAccount,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::social_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocialAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path() {
        assert!(TaskStatus::Available.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Completed.can_transition_to(TaskStatus::Approved));
        assert!(TaskStatus::Completed.can_transition_to(TaskStatus::Rejected));
    }

    #[test]
    fn release_back_to_pool() {
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Available));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Available));
    }

    #[test]
    fn no_skipping_or_reopening() {
        assert!(!TaskStatus::Available.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::InProgress.can_transition_to(TaskStatus::Approved));
        assert!(!TaskStatus::Approved.can_transition_to(TaskStatus::Rejected));
        assert!(!TaskStatus::Rejected.can_transition_to(TaskStatus::Available));
    }
}
