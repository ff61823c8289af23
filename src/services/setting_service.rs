use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::entities::setting;
use crate::error::AppError;

/// Platform settings an operator can change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    RegistrationOpen,
    MinWithdrawal,
    MinDeposit,
    TaskBatchSize,
}

impl SettingKey {
    pub const ALL: [Self; 4] = [
        Self::RegistrationOpen,
        Self::MinWithdrawal,
        Self::MinDeposit,
        Self::TaskBatchSize,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RegistrationOpen => "registration_open",
            Self::MinWithdrawal => "min_withdrawal",
            Self::MinDeposit => "min_deposit",
            Self::TaskBatchSize => "task_batch_size",
        }
    }

    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    #[must_use]
    pub const fn default_value(self) -> &'static str {
        match self {
            Self::RegistrationOpen => "true",
            Self::MinWithdrawal => "500",
            Self::MinDeposit => "100",
            Self::TaskBatchSize => "10",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::RegistrationOpen => "Whether new accounts can sign up",
            Self::MinWithdrawal => "Smallest withdrawal in cents",
            Self::MinDeposit => "Smallest deposit in cents",
            Self::TaskBatchSize => "Open tasks kept per processing order",
        }
    }

    /// Normalize a submitted value, or explain why it is unacceptable.
    pub fn normalize(self, raw: &str) -> Result<String, String> {
        let raw = raw.trim();
        match self {
            Self::RegistrationOpen => match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok("true".to_string()),
                "false" | "0" | "no" => Ok("false".to_string()),
                _ => Err(format!("{} must be a boolean.", self.as_str())),
            },
            Self::MinWithdrawal | Self::MinDeposit => match raw.parse::<i64>() {
                Ok(cents) if cents > 0 => Ok(cents.to_string()),
                _ => Err(format!("{} must be a positive amount in cents.", self.as_str())),
            },
            Self::TaskBatchSize => match raw.parse::<u64>() {
                Ok(size) if (1..=1000).contains(&size) => Ok(size.to_string()),
                _ => Err(format!("{} must be between 1 and 1000.", self.as_str())),
            },
        }
    }
}

/// A setting's current value, and its row when it has been set explicitly.
#[derive(Debug, Clone)]
pub struct EffectiveSetting {
    pub key: SettingKey,
    pub value: String,
    pub stored: Option<setting::Model>,
}

pub struct SettingService;

impl SettingService {
    async fn value<C: ConnectionTrait>(conn: &C, key: SettingKey) -> Result<String, AppError> {
        let stored = setting::Entity::find_by_id(key.as_str()).one(conn).await?;
        Ok(stored.map_or_else(|| key.default_value().to_string(), |row| row.value))
    }

    async fn number<C: ConnectionTrait>(conn: &C, key: SettingKey) -> Result<i64, AppError> {
        let raw = Self::value(conn, key).await?;
        Ok(raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key = key.as_str(), value = %raw, "Unparsable setting, using default");
            key.default_value().parse().unwrap_or_default()
        }))
    }

    pub async fn registration_open<C: ConnectionTrait>(conn: &C) -> Result<bool, AppError> {
        Ok(Self::value(conn, SettingKey::RegistrationOpen).await? != "false")
    }

    pub async fn min_withdrawal<C: ConnectionTrait>(conn: &C) -> Result<i64, AppError> {
        Self::number(conn, SettingKey::MinWithdrawal).await
    }

    pub async fn min_deposit<C: ConnectionTrait>(conn: &C) -> Result<i64, AppError> {
        Self::number(conn, SettingKey::MinDeposit).await
    }

    pub async fn task_batch_size<C: ConnectionTrait>(conn: &C) -> Result<u64, AppError> {
        let size = Self::number(conn, SettingKey::TaskBatchSize).await?;
        Ok(u64::try_from(size).unwrap_or(1).max(1))
    }

    /// Every known setting with its effective value.
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<EffectiveSetting>, AppError> {
        let rows = setting::Entity::find().all(db).await?;

        Ok(SettingKey::ALL
            .into_iter()
            .map(|key| {
                let stored = rows.iter().find(|row| row.key == key.as_str()).cloned();
                EffectiveSetting {
                    key,
                    value: stored
                        .as_ref()
                        .map_or_else(|| key.default_value().to_string(), |row| row.value.clone()),
                    stored,
                }
            })
            .collect())
    }

    /// Store a new value for `key`.
    pub async fn update(
        db: &DatabaseConnection,
        key: &str,
        value: &str,
        updated_by: Uuid,
    ) -> Result<EffectiveSetting, AppError> {
        let key = SettingKey::parse(key)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown setting '{key}'.")))?;
        let value = key.normalize(value).map_err(AppError::BadRequest)?;
        let now = Utc::now();

        let row = match setting::Entity::find_by_id(key.as_str()).one(db).await? {
            Some(existing) => {
                let mut active: setting::ActiveModel = existing.into();
                active.value = Set(value.clone());
                active.updated_by = Set(Some(updated_by));
                active.updated_at = Set(now.into());
                active.update(db).await?
            }
            None => {
                setting::ActiveModel {
                    key: Set(key.as_str().to_string()),
                    value: Set(value.clone()),
                    description: Set(Some(key.description().to_string())),
                    updated_by: Set(Some(updated_by)),
                    updated_at: Set(now.into()),
                }
                .insert(db)
                .await?
            }
        };

        tracing::info!(
            key = key.as_str(),
            value = %value,
            admin_id = %updated_by,
            "Setting updated"
        );
        Ok(EffectiveSetting {
            key,
            value,
            stored: Some(row),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_their_names() {
        for key in SettingKey::ALL {
            assert_eq!(SettingKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(SettingKey::parse("maintenance_mode"), None);
    }

    #[test]
    fn defaults_are_valid_values() {
        for key in SettingKey::ALL {
            assert_eq!(
                key.normalize(key.default_value()).as_deref(),
                Ok(key.default_value())
            );
        }
    }

    #[test]
    fn normalize_rejects_bad_values() {
        assert_eq!(
            SettingKey::RegistrationOpen.normalize(" No ").as_deref(),
            Ok("false")
        );
        assert!(SettingKey::MinDeposit.normalize("-5").is_err());
        assert!(SettingKey::MinWithdrawal.normalize("ten").is_err());
        assert!(SettingKey::TaskBatchSize.normalize("0").is_err());
        assert_eq!(SettingKey::TaskBatchSize.normalize("25").as_deref(), Ok("25"));
    }
}
