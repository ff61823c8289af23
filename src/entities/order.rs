use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::platform::Platform;
use super::task::TaskType;

/// Engagement product sold on an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    #[sea_orm(string_value = "likes")]
    Likes,
    #[sea_orm(string_value = "followers")]
    Followers,
    #[sea_orm(string_value = "views")]
    Views,
    #[sea_orm(string_value = "subscribers")]
    Subscribers,
}

impl ServiceType {
    /// The unit of work a task-doer performs to deliver one unit of this service.
    #[must_use]
    pub const fn task_type(self) -> TaskType {
        match self {
            Self::Likes => TaskType::Like,
            Self::Followers => TaskType::Follow,
            Self::Views => TaskType::Watch,
            Self::Subscribers => TaskType::Subscribe,
        }
    }
}

/// Order lifecycle status.
///
/// `pending → processing → completed`, with `failed`, `cancelled` and `refunded` as
/// the other terminal states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl OrderStatus {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::Processing | Self::Failed | Self::Cancelled
            ) | (
                Self::Processing,
                Self::Completed | Self::Failed | Self::Refunded
            )
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Refunded
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: Platform,
    pub service_type: ServiceType,
    pub target_url: String,
    pub quantity: i32,
    pub remaining_count: i32,
    /// Price per unit in cents, frozen at purchase time.
    pub unit_price: i64,
    /// Total charged in cents.
    pub amount: i64,
    pub status: OrderStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Units delivered so far.
    #[must_use]
    pub const fn delivered(&self) -> i32 {
        self.quantity - self.remaining_count
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
    #[sea_orm(has_many = "super::dispute::Entity")]
    Disputes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::dispute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Disputes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Failed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Refunded));
    }

    #[test]
    fn processing_transitions() {
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Refunded));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_states_are_final() {
        for from in [
            OrderStatus::Completed,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert!(from.is_terminal());
            for to in [
                OrderStatus::Pending,
                OrderStatus::Processing,
                OrderStatus::Completed,
                OrderStatus::Failed,
                OrderStatus::Cancelled,
                OrderStatus::Refunded,
            ] {
                assert!(!from.can_transition_to(to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn service_maps_to_task_type() {
        assert_eq!(ServiceType::Likes.task_type(), TaskType::Like);
        assert_eq!(ServiceType::Followers.task_type(), TaskType::Follow);
        assert_eq!(ServiceType::Views.task_type(), TaskType::Watch);
        assert_eq!(ServiceType::Subscribers.task_type(), TaskType::Subscribe);
    }
}
