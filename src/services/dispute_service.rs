use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{OrderService, Page, PageParams};
use crate::entities::dispute::{self, DisputeStatus};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct OpenDispute {
    pub order_id: Uuid,
    pub reason: String,
    pub description: String,
}

pub struct DisputeService;

impl DisputeService {
    /// Raise a dispute on one of the user's orders.
    pub async fn open(
        db: &DatabaseConnection,
        user_id: Uuid,
        input: OpenDispute,
    ) -> Result<dispute::Model, AppError> {
        let reason = input.reason.trim().to_string();
        let description = input.description.trim().to_string();

        let mut errors = Vec::new();
        if reason.is_empty() || reason.chars().count() > 100 {
            errors.push("Reason must be 1-100 characters.".to_string());
        }
        if description.is_empty() || description.chars().count() > 2000 {
            errors.push("Description must be 1-2000 characters.".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let order = OrderService::get_owned(db, user_id, input.order_id).await?;

        let active = dispute::Entity::find()
            .filter(dispute::Column::OrderId.eq(order.id))
            .filter(
                dispute::Column::Status.is_in([DisputeStatus::Open, DisputeStatus::UnderReview]),
            )
            .count(db)
            .await?;
        if active > 0 {
            return Err(AppError::Conflict(
                "This order already has an open dispute.".to_string(),
            ));
        }

        let now = Utc::now();
        let dispute = dispute::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            order_id: Set(order.id),
            reason: Set(reason),
            description: Set(description),
            status: Set(DisputeStatus::Open),
            resolution: Set(None),
            resolved_by: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            resolved_at: Set(None),
        }
        .insert(db)
        .await?;

        tracing::info!(
            user_id = %user_id,
            order_id = %order.id,
            dispute_id = %dispute.id,
            "Dispute opened"
        );
        Ok(dispute)
    }

    pub async fn get(
        db: &DatabaseConnection,
        dispute_id: Uuid,
    ) -> Result<dispute::Model, AppError> {
        dispute::Entity::find_by_id(dispute_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Dispute not found.".to_string()))
    }

    pub async fn get_owned(
        db: &DatabaseConnection,
        user_id: Uuid,
        dispute_id: Uuid,
    ) -> Result<dispute::Model, AppError> {
        let dispute = Self::get(db, dispute_id).await?;
        if dispute.user_id != user_id {
            return Err(AppError::NotFound("Dispute not found.".to_string()));
        }
        Ok(dispute)
    }

    /// Disputes newest first, optionally narrowed to one user and/or status.
    pub async fn list(
        db: &DatabaseConnection,
        user_id: Option<Uuid>,
        status: Option<DisputeStatus>,
        page: PageParams,
    ) -> Result<Page<dispute::Model>, AppError> {
        let mut query = dispute::Entity::find();
        if let Some(user_id) = user_id {
            query = query.filter(dispute::Column::UserId.eq(user_id));
        }
        if let Some(status) = status {
            query = query.filter(dispute::Column::Status.eq(status));
        }

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(dispute::Column::CreatedAt)
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

    /// Staff moves a dispute along its lifecycle.
    pub async fn update_status(
        db: &DatabaseConnection,
        staff_id: Uuid,
        dispute_id: Uuid,
        next: DisputeStatus,
        resolution: Option<String>,
    ) -> Result<dispute::Model, AppError> {
        let dispute = Self::get(db, dispute_id).await?;
        if !dispute.status.can_transition_to(next) {
            return Err(AppError::invalid_transition("dispute", dispute.status, next));
        }

        let resolution = resolution
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if next == DisputeStatus::Resolved && resolution.is_none() {
            return Err(AppError::Validation(vec![
                "A resolution is required to resolve a dispute.".to_string(),
            ]));
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let previous = dispute.status;
        let mut update = dispute::Entity::update_many()
            .col_expr(dispute::Column::Status, Expr::value(next))
            .col_expr(dispute::Column::UpdatedAt, Expr::value(now))
            .filter(dispute::Column::Id.eq(dispute.id))
            .filter(dispute::Column::Status.eq(previous));
        if let Some(resolution) = resolution {
            update = update.col_expr(dispute::Column::Resolution, Expr::value(resolution));
        }
        if next.is_final() {
            update = update
                .col_expr(dispute::Column::ResolvedBy, Expr::value(staff_id))
                .col_expr(dispute::Column::ResolvedAt, Expr::value(now));
        }

        if update.exec(db).await?.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Dispute was modified concurrently.".to_string(),
            ));
        }
        let dispute = Self::get(db, dispute_id).await?;

        tracing::info!(
            staff_id = %staff_id,
            dispute_id = %dispute.id,
            from = ?previous,
            to = ?next,
            "Dispute status changed"
        );
        Ok(dispute)
    }
}
