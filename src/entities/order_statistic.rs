use chrono::Duration;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::platform::Platform;

/// Lookback window used by rollups and analytics. Variants are ordered shortest first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Timeframe {
    #[sea_orm(string_value = "7d")]
    #[serde(rename = "7d")]
    Week,
    #[sea_orm(string_value = "30d")]
    #[serde(rename = "30d")]
    Month,
    #[sea_orm(string_value = "90d")]
    #[serde(rename = "90d")]
    Quarter,
    #[sea_orm(string_value = "1y")]
    #[serde(rename = "1y")]
    Year,
}

impl Timeframe {
    pub const ALL: [Self; 4] = [Self::Week, Self::Month, Self::Quarter, Self::Year];

    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        Duration::days(self.days())
    }

    /// Parse the wire form (`7d`, `30d`, `90d`, `1y`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "7d" => Some(Self::Week),
            "30d" => Some(Self::Month),
            "90d" => Some(Self::Quarter),
            "1y" => Some(Self::Year),
            _ => None,
        }
    }
}

/// Precomputed order rollup for one user, platform and timeframe.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_statistics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: Platform,
    pub timeframe: Timeframe,
    pub total_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    /// Cents.
    pub total_spent: i64,
    pub total_quantity: i64,
    pub delivered_quantity: i64,
    pub calculated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
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
    fn parse_wire_values() {
        assert_eq!(Timeframe::parse("7d"), Some(Timeframe::Week));
        assert_eq!(Timeframe::parse("30D"), Some(Timeframe::Month));
        assert_eq!(Timeframe::parse(" 90d "), Some(Timeframe::Quarter));
        assert_eq!(Timeframe::parse("1y"), Some(Timeframe::Year));
        assert_eq!(Timeframe::parse("2w"), None);
    }

    #[test]
    fn window_lengths() {
        assert_eq!(Timeframe::Week.days(), 7);
        assert_eq!(Timeframe::Year.duration(), Duration::days(365));
    }
}
