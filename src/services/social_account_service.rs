use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::Platform;
use crate::entities::social_account;
use crate::entities::task::{self, TaskStatus};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct CreateSocialAccount {
    pub platform: Platform,
    pub username: String,
    pub external_id: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSocialAccount {
    pub is_active: Option<bool>,
    /// An empty string clears the stored token.
    pub access_token: Option<String>,
}

/// Activity counters plus the work done through an account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialAccountStats {
    pub account_id: Uuid,
    pub platform: Platform,
    pub username: String,
    pub follows_count: i64,
    pub likes_count: i64,
    pub views_count: i64,
    pub subscriptions_count: i64,
    pub tasks_completed: i64,
    pub approved_tasks: u64,
    pub pending_tasks: u64,
    pub rejected_tasks: u64,
    /// Cents earned from approved tasks.
    pub total_earned: i64,
}

fn normalize_username(raw: &str) -> Result<String, AppError> {
    let username = raw.trim().trim_start_matches('@').to_string();
    let len = username.chars().count();
    if len == 0 || len > 100 {
        return Err(AppError::Validation(vec![
            "Username must be 1-100 characters.".to_string(),
        ]));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(vec![
            "Username may not contain whitespace.".to_string(),
        ]));
    }
    Ok(username)
}

fn duplicate_account(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("This account is already connected.".to_string())
        }
        _ => err.into(),
    }
}

pub struct SocialAccountService;

impl SocialAccountService {
    pub async fn create(
        db: &DatabaseConnection,
        user_id: Uuid,
        input: CreateSocialAccount,
    ) -> Result<social_account::Model, AppError> {
        let username = normalize_username(&input.username)?;
        let external_id = input
            .external_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if external_id.as_ref().is_some_and(|id| id.chars().count() > 100) {
            return Err(AppError::Validation(vec![
                "External id must be at most 100 characters.".to_string(),
            ]));
        }

        let exists = social_account::Entity::find()
            .filter(social_account::Column::UserId.eq(user_id))
            .filter(social_account::Column::Platform.eq(input.platform))
            .filter(social_account::Column::Username.eq(&username))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(AppError::Conflict(
                "This account is already connected.".to_string(),
            ));
        }

        let now = Utc::now();
        let account = social_account::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            platform: Set(input.platform),
            username: Set(username),
            external_id: Set(external_id),
            access_token: Set(input.access_token.filter(|s| !s.is_empty())),
            is_active: Set(true),
            follows_count: Set(0),
            likes_count: Set(0),
            views_count: Set(0),
            subscriptions_count: Set(0),
            tasks_completed: Set(0),
            last_activity_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await
        .map_err(duplicate_account)?;

        tracing::info!(
            user_id = %user_id,
            account_id = %account.id,
            platform = ?account.platform,
            "Social account connected"
        );
        Ok(account)
    }

    pub async fn list(
        db: &DatabaseConnection,
        user_id: Uuid,
        platform: Option<Platform>,
    ) -> Result<Vec<social_account::Model>, AppError> {
        let mut query =
            social_account::Entity::find().filter(social_account::Column::UserId.eq(user_id));
        if let Some(platform) = platform {
            query = query.filter(social_account::Column::Platform.eq(platform));
        }
        Ok(query
            .order_by_asc(social_account::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn get(
        db: &DatabaseConnection,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<social_account::Model, AppError> {
        social_account::Entity::find_by_id(account_id)
            .filter(social_account::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Social account not found.".to_string()))
    }

    pub async fn stats(
        db: &DatabaseConnection,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<SocialAccountStats, AppError> {
        let account = Self::get(db, user_id, account_id).await?;

        let tasks: Vec<(TaskStatus, i64)> = task::Entity::find()
            .select_only()
            .column(task::Column::Status)
            .column(task::Column::Reward)
            .filter(task::Column::SocialAccountId.eq(account.id))
            .into_tuple()
            .all(db)
            .await?;

        let mut stats = SocialAccountStats {
            account_id: account.id,
            platform: account.platform,
            username: account.username,
            follows_count: account.follows_count,
            likes_count: account.likes_count,
            views_count: account.views_count,
            subscriptions_count: account.subscriptions_count,
            tasks_completed: account.tasks_completed,
            approved_tasks: 0,
            pending_tasks: 0,
            rejected_tasks: 0,
            total_earned: 0,
        };
        for (status, reward) in tasks {
            match status {
                TaskStatus::Approved => {
                    stats.approved_tasks += 1;
                    stats.total_earned += reward;
                }
                TaskStatus::InProgress | TaskStatus::Completed => stats.pending_tasks += 1,
                TaskStatus::Rejected => stats.rejected_tasks += 1,
                TaskStatus::Available => {}
            }
        }
        Ok(stats)
    }

    pub async fn update(
        db: &DatabaseConnection,
        user_id: Uuid,
        account_id: Uuid,
        input: UpdateSocialAccount,
    ) -> Result<social_account::Model, AppError> {
        let account = Self::get(db, user_id, account_id).await?;

        let mut active: social_account::ActiveModel = account.into();
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(token) = input.access_token {
            active.access_token = Set(Some(token).filter(|t| !t.is_empty()));
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(db).await?)
    }

    /// Disconnect an account. Tasks done through it keep their history.
    pub async fn delete(
        db: &DatabaseConnection,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<(), AppError> {
        let account = Self::get(db, user_id, account_id).await?;
        account.delete(db).await?;

        tracing::info!(user_id = %user_id, account_id = %account_id, "Social account removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_lose_leading_at() {
        assert_eq!(normalize_username(" @rust_lang ").ok().as_deref(), Some("rust_lang"));
        assert!(normalize_username("@").is_err());
        assert!(normalize_username("two words").is_err());
    }
}
