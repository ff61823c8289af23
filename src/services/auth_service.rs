use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};
use uuid::Uuid;

use super::{ClientInfo, SessionService, SettingService};
use crate::auth::password::{
    hash_password, registration_errors, validate_password, verify_password,
};
use crate::config::Config;
use crate::entities::session::{self, SessionScope};
use crate::entities::user::{self, AccountStatus, Role, UserMode};
use crate::error::AppError;

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
    pub mode: Option<UserMode>,
}

/// A signed-in user with the session just opened for them.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: user::Model,
    pub session: session::Model,
    pub token: String,
}

pub struct AuthService;

impl AuthService {
    /// Create an account and sign it in.
    pub async fn register(
        db: &DatabaseConnection,
        config: &Config,
        input: RegisterInput,
        client: &ClientInfo,
    ) -> Result<AuthOutcome, AppError> {
        if !SettingService::registration_open(db).await? {
            return Err(AppError::Forbidden(
                "Registration is currently closed.".to_string(),
            ));
        }

        let email = input.email.trim().to_lowercase();
        let username = input.username.trim().to_string();

        let mut errors = registration_errors(&email, &username, &input.password);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        if user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(db)
            .await?
            .is_some()
        {
            errors.push("Email is already registered.".to_string());
        }
        if user::Entity::find()
            .filter(user::Column::Username.eq(&username))
            .one(db)
            .await?
            .is_some()
        {
            errors.push("Username is already taken.".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();

        let txn = db.begin().await?;
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            username: Set(username),
            password_hash: Set(password_hash),
            role: Set(Role::User),
            balance: Set(0),
            mode: Set(input.mode.unwrap_or(UserMode::TaskDoer)),
            account_status: Set(AccountStatus::Active),
            suspension_reason: Set(None),
            last_login_at: Set(Some(now.into())),
            last_login_ip: Set(client.ip_address.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(duplicate_account)?;

        let (session, token) = SessionService::create(
            &txn,
            user.id,
            SessionScope::User,
            config.session_ttl_secs,
            client,
            &config.jwt_secret,
        )
        .await?;
        txn.commit().await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(AuthOutcome {
            user,
            session,
            token,
        })
    }

    /// Email/password sign-in for the user API.
    pub async fn login(
        db: &DatabaseConnection,
        config: &Config,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<AuthOutcome, AppError> {
        let user = Self::check_credentials(db, email, password).await?;
        Self::open_session(db, config, user, SessionScope::User, client).await
    }

    /// Sign-in for the admin panel. Only staff roles get an admin session.
    pub async fn admin_login(
        db: &DatabaseConnection,
        config: &Config,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<AuthOutcome, AppError> {
        let user = Self::check_credentials(db, email, password).await?;
        if !user.role.is_staff() {
            tracing::warn!(user_id = %user.id, "Non-staff account attempted admin login");
            return Err(AppError::Forbidden("Admin access required.".to_string()));
        }
        Self::open_session(db, config, user, SessionScope::Admin, client).await
    }

    async fn check_credentials(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
    ) -> Result<user::Model, AppError> {
        let email = email.trim().to_lowercase();
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(db)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let matches = verify_password(password, &user.password_hash).unwrap_or_else(|err| {
            tracing::error!(user_id = %user.id, "Stored password hash is unreadable: {err:#}");
            false
        });
        if !matches {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if user.account_status == AccountStatus::Suspended {
            return Err(AppError::Forbidden("Account is suspended.".to_string()));
        }
        Ok(user)
    }

    async fn open_session(
        db: &DatabaseConnection,
        config: &Config,
        user: user::Model,
        scope: SessionScope,
        client: &ClientInfo,
    ) -> Result<AuthOutcome, AppError> {
        let ttl = match scope {
            SessionScope::User => config.session_ttl_secs,
            SessionScope::Admin => config.admin_session_ttl_secs,
        };

        let txn = db.begin().await?;
        let mut active: user::ActiveModel = user.into();
        active.last_login_at = Set(Some(Utc::now().into()));
        active.last_login_ip = Set(client.ip_address.clone());
        let user = active.update(&txn).await?;

        let (session, token) =
            SessionService::create(&txn, user.id, scope, ttl, client, &config.jwt_secret).await?;
        txn.commit().await?;

        tracing::info!(user_id = %user.id, ?scope, "User logged in");
        Ok(AuthOutcome {
            user,
            session,
            token,
        })
    }

    /// Replace the password and sign out every other session.
    pub async fn change_password(
        db: &DatabaseConnection,
        user: user::Model,
        keep_session: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if !verify_password(current_password, &user.password_hash).unwrap_or(false) {
            return Err(AppError::BadRequest(
                "Current password is incorrect.".to_string(),
            ));
        }
        validate_password(new_password).map_err(|e| AppError::Validation(vec![e]))?;

        let password_hash = hash_password(new_password)?;
        let user_id = user.id;

        let txn = db.begin().await?;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
        SessionService::revoke_all_for_user(&txn, user_id, Some(keep_session)).await?;
        txn.commit().await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

/// Unique-index races on email/username surface as validation errors.
fn duplicate_account(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Validation(vec![
            "Email or username is already registered.".to_string(),
        ]),
        _ => err.into(),
    }
}
