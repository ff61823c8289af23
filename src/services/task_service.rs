use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{
    LedgerEntry, OrderService, Page, PageParams, SettingService, TransactionService,
    clean_reason, pricing,
};
use crate::entities::Platform;
use crate::entities::order::{self, OrderStatus};
use crate::entities::social_account;
use crate::entities::task::{self, TaskStatus, TaskType};
use crate::entities::transaction::TransactionKind;
use crate::entities::user::{self, UserMode};
use crate::error::AppError;

const MAX_PROOF_LEN: usize = 2000;

pub struct TaskService;

impl TaskService {
    /// Top up an order's pool to `min(remaining, task_batch_size)` open tasks.
    /// Returns how many tasks were published.
    pub async fn replenish<C: ConnectionTrait>(
        conn: &C,
        order: &order::Model,
    ) -> Result<u64, AppError> {
        if order.status != OrderStatus::Processing || order.remaining_count <= 0 {
            return Ok(0);
        }

        let rate = pricing::quote(order.platform, order.service_type).ok_or_else(|| {
            anyhow::anyhow!(
                "Order {} has no price for {:?} {:?}",
                order.id,
                order.platform,
                order.service_type
            )
        })?;

        let batch = SettingService::task_batch_size(conn).await?;
        let remaining = u64::try_from(order.remaining_count).unwrap_or_default();
        let open = task::Entity::find()
            .filter(task::Column::OrderId.eq(order.id))
            .filter(task::Column::Status.is_in(TaskStatus::OPEN))
            .count(conn)
            .await?;

        let wanted = remaining.min(batch).saturating_sub(open);
        if wanted == 0 {
            return Ok(0);
        }

        let now = Utc::now();
        let tasks = (0..wanted).map(|_| task::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(Some(order.id)),
            assignee_id: Set(None),
            social_account_id: Set(None),
            platform: Set(order.platform),
            task_type: Set(order.service_type.task_type()),
            target_url: Set(order.target_url.clone()),
            reward: Set(rate.task_reward),
            status: Set(TaskStatus::Available),
            proof: Set(None),
            rejection_reason: Set(None),
            claimed_at: Set(None),
            completed_at: Set(None),
            reviewed_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        });
        task::Entity::insert_many(tasks)
            .exec_without_returning(conn)
            .await?;

        tracing::debug!(order_id = %order.id, published = wanted, "Task pool replenished");
        Ok(wanted)
    }

    pub async fn get<C: ConnectionTrait>(conn: &C, task_id: Uuid) -> Result<task::Model, AppError> {
        task::Entity::find_by_id(task_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found.".to_string()))
    }

    /// Tasks the user may claim: open slots on other users' processing orders they
    /// have not already worked on.
    pub async fn list_available(
        db: &DatabaseConnection,
        user_id: Uuid,
        platform: Option<Platform>,
        page: PageParams,
    ) -> Result<Page<task::Model>, AppError> {
        let held_orders = Query::select()
            .column(task::Column::OrderId)
            .from(task::Entity)
            .and_where(task::Column::AssigneeId.eq(user_id))
            .and_where(task::Column::Status.ne(TaskStatus::Rejected))
            .and_where(task::Column::OrderId.is_not_null())
            .to_owned();

        let mut query = task::Entity::find()
            .inner_join(order::Entity)
            .filter(task::Column::Status.eq(TaskStatus::Available))
            .filter(order::Column::Status.eq(OrderStatus::Processing))
            .filter(order::Column::UserId.ne(user_id))
            .filter(task::Column::OrderId.not_in_subquery(held_orders));
        if let Some(platform) = platform {
            query = query.filter(task::Column::Platform.eq(platform));
        }

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_asc(task::Column::CreatedAt)
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

    /// Take an available task, optionally through one of the user's social accounts.
    pub async fn claim(
        db: &DatabaseConnection,
        user: &user::Model,
        task_id: Uuid,
        social_account_id: Option<Uuid>,
    ) -> Result<task::Model, AppError> {
        if user.mode != UserMode::TaskDoer {
            return Err(AppError::Forbidden(
                "Switch to task-doer mode to claim tasks.".to_string(),
            ));
        }

        let txn = db.begin().await?;
        let task = Self::get(&txn, task_id).await?;
        if !task.status.can_transition_to(TaskStatus::InProgress) {
            return Err(AppError::invalid_transition(
                "task",
                task.status,
                TaskStatus::InProgress,
            ));
        }

        if let Some(order_id) = task.order_id {
            let order = OrderService::get(&txn, order_id).await?;
            if order.user_id == user.id {
                return Err(AppError::Forbidden(
                    "You cannot work on your own order.".to_string(),
                ));
            }
            if order.status != OrderStatus::Processing {
                return Err(AppError::Conflict(
                    "The order is no longer accepting work.".to_string(),
                ));
            }

            let already_holding = task::Entity::find()
                .filter(task::Column::OrderId.eq(order_id))
                .filter(task::Column::AssigneeId.eq(user.id))
                .filter(task::Column::Status.ne(TaskStatus::Rejected))
                .count(&txn)
                .await?;
            if already_holding > 0 {
                return Err(AppError::Conflict(
                    "You already have a task for this order.".to_string(),
                ));
            }
        }

        if let Some(account_id) = social_account_id {
            let account = social_account::Entity::find_by_id(account_id)
                .filter(social_account::Column::UserId.eq(user.id))
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Social account not found.".to_string()))?;
            if !account.is_active {
                return Err(AppError::BadRequest(
                    "Social account is deactivated.".to_string(),
                ));
            }
            if account.platform != task.platform {
                return Err(AppError::BadRequest(
                    "Social account is on a different platform than the task.".to_string(),
                ));
            }
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let claimed = task::Entity::update_many()
            .col_expr(task::Column::Status, Expr::value(TaskStatus::InProgress))
            .col_expr(task::Column::AssigneeId, Expr::value(user.id))
            .col_expr(task::Column::SocialAccountId, Expr::value(social_account_id))
            .col_expr(task::Column::ClaimedAt, Expr::value(now))
            .col_expr(task::Column::UpdatedAt, Expr::value(now))
            .filter(task::Column::Id.eq(task.id))
            .filter(task::Column::Status.eq(TaskStatus::Available))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(AppError::Conflict("Task was already claimed.".to_string()));
        }

        let task = Self::get(&txn, task_id).await?;
        txn.commit().await?;

        tracing::info!(user_id = %user.id, task_id = %task.id, "Task claimed");
        Ok(task)
    }

    async fn assigned_to(
        db: &DatabaseConnection,
        user_id: Uuid,
        task_id: Uuid,
    ) -> Result<task::Model, AppError> {
        let task = Self::get(db, task_id).await?;
        if task.assignee_id != Some(user_id) {
            return Err(AppError::Forbidden(
                "This task is not assigned to you.".to_string(),
            ));
        }
        Ok(task)
    }

    /// Hand an in-progress task back to the pool.
    pub async fn release(
        db: &DatabaseConnection,
        user_id: Uuid,
        task_id: Uuid,
    ) -> Result<task::Model, AppError> {
        let task = Self::assigned_to(db, user_id, task_id).await?;
        if !task.status.can_transition_to(TaskStatus::Available) {
            return Err(AppError::invalid_transition(
                "task",
                task.status,
                TaskStatus::Available,
            ));
        }

        let mut active: task::ActiveModel = task.into();
        active.status = Set(TaskStatus::Available);
        active.assignee_id = Set(None);
        active.social_account_id = Set(None);
        active.claimed_at = Set(None);
        active.proof = Set(None);
        active.updated_at = Set(Utc::now().into());
        let task = active.update(db).await?;

        tracing::info!(user_id = %user_id, task_id = %task.id, "Task released");
        Ok(task)
    }

    /// Mark an in-progress task done and submit it for review.
    pub async fn complete(
        db: &DatabaseConnection,
        user_id: Uuid,
        task_id: Uuid,
        proof: Option<String>,
    ) -> Result<task::Model, AppError> {
        let proof = proof.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        if proof.as_ref().is_some_and(|p| p.chars().count() > MAX_PROOF_LEN) {
            return Err(AppError::Validation(vec![format!(
                "Proof must be at most {MAX_PROOF_LEN} characters."
            )]));
        }

        let task = Self::assigned_to(db, user_id, task_id).await?;
        if !task.status.can_transition_to(TaskStatus::Completed) {
            return Err(AppError::invalid_transition(
                "task",
                task.status,
                TaskStatus::Completed,
            ));
        }

        let now = Utc::now();
        let mut active: task::ActiveModel = task.into();
        active.status = Set(TaskStatus::Completed);
        active.proof = Set(proof);
        active.completed_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        let task = active.update(db).await?;

        tracing::info!(user_id = %user_id, task_id = %task.id, "Task completed");
        Ok(task)
    }

    /// Approve or reject a completed task.
    ///
    /// Reviewers are the owner of the task's order, or staff acting through the
    /// admin API (`as_staff`). Approval pays the assignee and counts one delivered
    /// unit against the order.
    pub async fn review(
        db: &DatabaseConnection,
        reviewer: &user::Model,
        as_staff: bool,
        task_id: Uuid,
        approve: bool,
        reason: Option<String>,
    ) -> Result<task::Model, AppError> {
        let next = if approve {
            TaskStatus::Approved
        } else {
            TaskStatus::Rejected
        };
        let reason = clean_reason(reason.as_deref())?;
        if !approve && reason.is_none() {
            return Err(AppError::Validation(vec![
                "A reason is required to reject a task.".to_string(),
            ]));
        }

        let txn = db.begin().await?;
        let task = Self::get(&txn, task_id).await?;
        let order = match task.order_id {
            Some(order_id) => Some(OrderService::get(&txn, order_id).await?),
            None => None,
        };

        let owns_order = order.as_ref().is_some_and(|o| o.user_id == reviewer.id);
        if !owns_order && !(as_staff && reviewer.role.is_staff()) {
            return Err(AppError::Forbidden(
                "Only the order owner or staff can review this task.".to_string(),
            ));
        }
        if !task.status.can_transition_to(next) {
            return Err(AppError::invalid_transition("task", task.status, next));
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let reviewed = task::Entity::update_many()
            .col_expr(task::Column::Status, Expr::value(next))
            .col_expr(task::Column::RejectionReason, Expr::value(reason))
            .col_expr(task::Column::ReviewedAt, Expr::value(now))
            .col_expr(task::Column::UpdatedAt, Expr::value(now))
            .filter(task::Column::Id.eq(task.id))
            .filter(task::Column::Status.eq(TaskStatus::Completed))
            .exec(&txn)
            .await?;
        if reviewed.rows_affected == 0 {
            return Err(AppError::Conflict("Task was already reviewed.".to_string()));
        }

        let order = if approve {
            Self::pay_out(&txn, &task, now).await?;
            match order {
                Some(order) => Some(OrderService::record_delivery(&txn, order.id).await?),
                None => None,
            }
        } else {
            order
        };

        if let Some(order) = &order {
            Self::replenish(&txn, order).await?;
        }

        let task = Self::get(&txn, task_id).await?;
        txn.commit().await?;

        tracing::info!(
            reviewer_id = %reviewer.id,
            task_id = %task.id,
            status = ?task.status,
            "Task reviewed"
        );
        Ok(task)
    }

    /// Credit the assignee and bump the linked social account's counters.
    async fn pay_out<C: ConnectionTrait>(
        conn: &C,
        task: &task::Model,
        now: sea_orm::prelude::DateTimeWithTimeZone,
    ) -> Result<(), AppError> {
        let Some(assignee_id) = task.assignee_id else {
            return Ok(());
        };

        let mut entry = LedgerEntry::new(assignee_id, TransactionKind::TaskEarning, task.reward)
            .for_task(task.id)
            .describe(format!("{:?} task on {:?}", task.task_type, task.platform));
        entry.order_id = task.order_id;
        TransactionService::record(conn, entry).await?;

        if let Some(account_id) = task.social_account_id {
            let counter = match task.task_type {
                TaskType::Like => social_account::Column::LikesCount,
                TaskType::Follow => social_account::Column::FollowsCount,
                TaskType::Watch => social_account::Column::ViewsCount,
                TaskType::Subscribe => social_account::Column::SubscriptionsCount,
            };
            social_account::Entity::update_many()
                .col_expr(counter, Expr::col(counter).add(1))
                .col_expr(
                    social_account::Column::TasksCompleted,
                    Expr::col(social_account::Column::TasksCompleted).add(1),
                )
                .col_expr(social_account::Column::LastActivityAt, Expr::value(now))
                .col_expr(social_account::Column::UpdatedAt, Expr::value(now))
                .filter(social_account::Column::Id.eq(account_id))
                .exec(conn)
                .await?;
        }
        Ok(())
    }

    /// Tasks assigned to a user, newest first.
    pub async fn list_mine(
        db: &DatabaseConnection,
        user_id: Uuid,
        status: Option<TaskStatus>,
        page: PageParams,
    ) -> Result<Page<task::Model>, AppError> {
        let mut query = task::Entity::find().filter(task::Column::AssigneeId.eq(user_id));
        if let Some(status) = status {
            query = query.filter(task::Column::Status.eq(status));
        }
        Self::paginate(db, query, page).await
    }

    /// Tasks on one order, for its owner or staff.
    pub async fn list_for_order(
        db: &DatabaseConnection,
        order_id: Uuid,
        status: Option<TaskStatus>,
        page: PageParams,
    ) -> Result<Page<task::Model>, AppError> {
        let mut query = task::Entity::find().filter(task::Column::OrderId.eq(order_id));
        if let Some(status) = status {
            query = query.filter(task::Column::Status.eq(status));
        }
        Self::paginate(db, query, page).await
    }

    pub async fn list_all(
        db: &DatabaseConnection,
        status: Option<TaskStatus>,
        platform: Option<Platform>,
        page: PageParams,
    ) -> Result<Page<task::Model>, AppError> {
        let mut query = task::Entity::find();
        if let Some(status) = status {
            query = query.filter(task::Column::Status.eq(status));
        }
        if let Some(platform) = platform {
            query = query.filter(task::Column::Platform.eq(platform));
        }
        Self::paginate(db, query, page).await
    }

    async fn paginate(
        db: &DatabaseConnection,
        query: sea_orm::Select<task::Entity>,
        page: PageParams,
    ) -> Result<Page<task::Model>, AppError> {
        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(task::Column::UpdatedAt)
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
}
