use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::auth::jwt::{decode_session_token, issue_session_token};
use crate::entities::session::{self, SessionScope};
use crate::entities::user::{self, AccountStatus};
use crate::error::AppError;

/// Ten years; longer lifetimes are clamped.
const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

/// `last_seen_at` is only rewritten when it is older than this.
const TOUCH_INTERVAL_SECS: i64 = 60;

/// Request metadata stored alongside a session.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

pub struct SessionService;

impl SessionService {
    /// Insert a session row and sign its bearer token.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        scope: SessionScope,
        ttl_secs: u64,
        client: &ClientInfo,
        secret: &str,
    ) -> Result<(session::Model, String), AppError> {
        let now = Utc::now();
        let ttl = i64::try_from(ttl_secs)
            .unwrap_or(MAX_TTL_SECS)
            .min(MAX_TTL_SECS);
        let expires_at = now + Duration::seconds(ttl);

        let session = session::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            scope: Set(scope),
            ip_address: Set(client.ip_address.clone()),
            user_agent: Set(client.user_agent.clone()),
            created_at: Set(now.into()),
            last_seen_at: Set(now.into()),
            expires_at: Set(expires_at.into()),
        }
        .insert(conn)
        .await?;

        let token = issue_session_token(user_id, session.id, scope, expires_at, secret)?;

        tracing::info!(user_id = %user_id, session_id = %session.id, ?scope, "Session created");
        Ok((session, token))
    }

    /// Resolve a bearer token to its user and live session.
    pub async fn authenticate(
        db: &DatabaseConnection,
        token: &str,
        secret: &str,
    ) -> Result<(user::Model, session::Model), AppError> {
        let claims = decode_session_token(token, secret)
            .map_err(|_| AppError::Unauthorized("Invalid token.".to_string()))?;
        let session_id = claims
            .session_id()
            .map_err(|_| AppError::Unauthorized("Invalid token.".to_string()))?;

        let session = session::Entity::find_by_id(session_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Session not found or revoked.".to_string()))?;

        if session.user_id.to_string() != claims.sub || session.scope != claims.scope {
            return Err(AppError::Unauthorized("Invalid token.".to_string()));
        }

        let now = Utc::now();
        if session.expires_at.with_timezone(&Utc) <= now {
            tracing::debug!(session_id = %session.id, "Removing expired session");
            session.delete(db).await?;
            return Err(AppError::Unauthorized("Session expired.".to_string()));
        }

        let user = user::Entity::find_by_id(session.user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Session not found or revoked.".to_string()))?;

        if user.account_status == AccountStatus::Suspended {
            return Err(AppError::Forbidden("Account is suspended.".to_string()));
        }

        let session = if now - session.last_seen_at.with_timezone(&Utc)
            > Duration::seconds(TOUCH_INTERVAL_SECS)
        {
            let mut active: session::ActiveModel = session.into();
            active.last_seen_at = Set(now.into());
            active.update(db).await?
        } else {
            session
        };

        Ok((user, session))
    }

    /// Unexpired sessions of a user, most recently used first.
    pub async fn list_active(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<Vec<session::Model>, AppError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        Ok(session::Entity::find()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::ExpiresAt.gt(now))
            .order_by_desc(session::Column::LastSeenAt)
            .all(db)
            .await?)
    }

    /// Delete one of the user's sessions.
    pub async fn revoke(
        db: &DatabaseConnection,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<(), AppError> {
        let result = session::Entity::delete_many()
            .filter(session::Column::Id.eq(session_id))
            .filter(session::Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Session not found.".to_string()));
        }
        Ok(())
    }

    /// Delete every session of a user, optionally keeping one.
    pub async fn revoke_all_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<u64, AppError> {
        let mut query =
            session::Entity::delete_many().filter(session::Column::UserId.eq(user_id));
        if let Some(keep) = except {
            query = query.filter(session::Column::Id.ne(keep));
        }
        let result = query.exec(conn).await?;

        tracing::info!(user_id = %user_id, revoked = result.rows_affected, "Sessions revoked");
        Ok(result.rows_affected)
    }

    /// Delete every expired session.
    pub async fn purge_expired(db: &DatabaseConnection) -> Result<u64, AppError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(now))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
