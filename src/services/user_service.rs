use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{Page, PageParams, SessionService, clean_reason};
use crate::auth::password::validate_username;
use crate::entities::user::{self, AccountStatus, Role, UserMode};
use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Substring of email or username.
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
}

pub struct UserService;

impl UserService {
    pub async fn get(db: &DatabaseConnection, user_id: Uuid) -> Result<user::Model, AppError> {
        user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
    }

    pub async fn update_username(
        db: &DatabaseConnection,
        user: user::Model,
        username: &str,
    ) -> Result<user::Model, AppError> {
        let username = username.trim();
        validate_username(username).map_err(|e| AppError::Validation(vec![e]))?;

        if username == user.username {
            return Ok(user);
        }

        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::Id.ne(user.id))
            .one(db)
            .await?
            .is_some();
        if taken {
            return Err(AppError::Validation(vec![
                "Username is already taken.".to_string(),
            ]));
        }

        let mut active: user::ActiveModel = user.into();
        active.username = Set(username.to_string());
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(db).await?)
    }

    pub async fn set_mode(
        db: &DatabaseConnection,
        user: user::Model,
        mode: UserMode,
    ) -> Result<user::Model, AppError> {
        if user.mode == mode {
            return Ok(user);
        }
        let user_id = user.id;
        let mut active: user::ActiveModel = user.into();
        active.mode = Set(mode);
        active.updated_at = Set(Utc::now().into());
        let user = active.update(db).await?;

        tracing::info!(user_id = %user_id, ?mode, "User mode switched");
        Ok(user)
    }

    pub async fn list(
        db: &DatabaseConnection,
        filter: UserFilter,
        page: PageParams,
    ) -> Result<Page<user::Model>, AppError> {
        let mut query = user::Entity::find();

        if let Some(search) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(
                Condition::any()
                    .add(user::Column::Email.contains(search.to_lowercase()))
                    .add(user::Column::Username.contains(search)),
            );
        }
        if let Some(role) = filter.role {
            query = query.filter(user::Column::Role.eq(role));
        }
        if let Some(status) = filter.status {
            query = query.filter(user::Column::AccountStatus.eq(status));
        }

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(user::Column::CreatedAt)
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

    /// Change another user's role.
    pub async fn set_role(
        db: &DatabaseConnection,
        actor: &user::Model,
        target_id: Uuid,
        role: Role,
    ) -> Result<user::Model, AppError> {
        if actor.id == target_id {
            return Err(AppError::Forbidden(
                "You cannot change your own role.".to_string(),
            ));
        }

        let target = Self::get(db, target_id).await?;
        let previous = target.role;
        let mut active: user::ActiveModel = target.into();
        active.role = Set(role);
        active.updated_at = Set(Utc::now().into());
        let target = active.update(db).await?;

        tracing::info!(
            admin_id = %actor.id,
            user_id = %target_id,
            from = ?previous,
            to = ?role,
            "User role changed"
        );
        Ok(target)
    }

    /// Suspend (with a reason) or reactivate an account. Suspension signs the user out.
    pub async fn set_status(
        db: &DatabaseConnection,
        actor: &user::Model,
        target_id: Uuid,
        status: AccountStatus,
        reason: Option<String>,
    ) -> Result<user::Model, AppError> {
        if actor.id == target_id {
            return Err(AppError::Forbidden(
                "You cannot change your own account status.".to_string(),
            ));
        }

        let reason = clean_reason(reason.as_deref())?;
        if status == AccountStatus::Suspended && reason.is_none() {
            return Err(AppError::Validation(vec![
                "A reason is required to suspend an account.".to_string(),
            ]));
        }

        let target = Self::get(db, target_id).await?;
        if target.role >= actor.role {
            return Err(AppError::Forbidden(
                "You cannot change the status of an equal or higher role.".to_string(),
            ));
        }

        let txn = db.begin().await?;
        let mut active: user::ActiveModel = target.into();
        active.account_status = Set(status);
        active.suspension_reason = Set(match status {
            AccountStatus::Suspended => reason,
            AccountStatus::Active => None,
        });
        active.updated_at = Set(Utc::now().into());
        let target = active.update(&txn).await?;
        if status == AccountStatus::Suspended {
            SessionService::revoke_all_for_user(&txn, target_id, None).await?;
        }
        txn.commit().await?;

        tracing::info!(
            admin_id = %actor.id,
            user_id = %target_id,
            ?status,
            "Account status changed"
        );
        Ok(target)
    }
}
