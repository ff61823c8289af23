use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Social network an order, task or connected account targets.
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
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[sea_orm(string_value = "instagram")]
    Instagram,
    #[sea_orm(string_value = "youtube")]
    Youtube,
}

impl Platform {
    /// Hosts accepted in target URLs for this platform.
    #[must_use]
    pub const fn hosts(self) -> &'static [&'static str] {
        match self {
            Self::Instagram => &["instagram.com", "www.instagram.com"],
            Self::Youtube => &["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"],
        }
    }
}
