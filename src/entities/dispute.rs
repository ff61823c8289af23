use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dispute lifecycle: `open → under_review → resolved | closed`, or `open → closed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "under_review")]
    UnderReview,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl DisputeStatus {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::UnderReview | Self::Closed)
                | (Self::UnderReview, Self::Resolved | Self::Closed)
        )
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "disputes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Uuid,
    pub reason: String,
    pub description: String,
    pub status: DisputeStatus,
    pub resolution: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub resolved_at: Option<DateTimeWithTimeZone>,
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
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_path() {
        assert!(DisputeStatus::Open.can_transition_to(DisputeStatus::UnderReview));
        assert!(DisputeStatus::UnderReview.can_transition_to(DisputeStatus::Resolved));
        assert!(DisputeStatus::UnderReview.can_transition_to(DisputeStatus::Closed));
    }

    #[test]
    fn open_can_be_closed_but_not_resolved() {
        assert!(DisputeStatus::Open.can_transition_to(DisputeStatus::Closed));
        assert!(!DisputeStatus::Open.can_transition_to(DisputeStatus::Resolved));
    }

    #[test]
    fn final_states() {
        assert!(DisputeStatus::Resolved.is_final());
        assert!(DisputeStatus::Closed.is_final());
        assert!(!DisputeStatus::Resolved.can_transition_to(DisputeStatus::Open));
        assert!(!DisputeStatus::Closed.can_transition_to(DisputeStatus::UnderReview));
    }
}
