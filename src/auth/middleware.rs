use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::bearer_token;
use crate::entities::session::{self, SessionScope};
use crate::entities::user::{self, Role};
use crate::error::AppError;
use crate::services::SessionService;
use crate::state::AppState;

/// Authenticated principal extracted from the `Authorization: Bearer <token>` header.
///
/// Use as an extractor in handler parameters to require authentication:
/// ```ignore
/// async fn handler(AuthUser { user, .. }: AuthUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: user::Model,
    pub session: session::Model,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
            return Err(AppError::Unauthorized(
                "Missing authorization header.".to_string(),
            ));
        }

        let token = bearer_token(&parts.headers).ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format.".to_string())
        })?;

        let (user, session) =
            SessionService::authenticate(&state.db, token, &state.config.jwt_secret).await?;

        Ok(Self { user, session })
    }
}

/// Resolve a principal from an admin-scope session holding at least `minimum`.
async fn require_staff(
    parts: &mut Parts,
    state: &AppState,
    minimum: Role,
) -> Result<user::Model, AppError> {
    let AuthUser { user, session } = AuthUser::from_request_parts(parts, state).await?;

    if session.scope != SessionScope::Admin {
        return Err(AppError::Forbidden(
            "Admin session required. Sign in through the admin panel.".to_string(),
        ));
    }

    if user.role < minimum {
        return Err(AppError::Forbidden(format!(
            "{} role required.",
            match minimum {
                Role::User | Role::Moderator => "Moderator or higher",
                Role::Admin => "Admin or higher",
                Role::SuperAdmin => "Super admin",
            }
        )));
    }

    Ok(user)
}

/// Requires an admin-panel session and at least the `moderator` role.
#[derive(Debug, Clone)]
pub struct StaffUser(pub user::Model);

impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_staff(parts, state, Role::Moderator).await.map(Self)
    }
}

/// Requires an admin-panel session and at least the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_staff(parts, state, Role::Admin).await.map(Self)
    }
}

/// Requires an admin-panel session and the `super_admin` role.
#[derive(Debug, Clone)]
pub struct SuperAdminUser(pub user::Model);

impl FromRequestParts<AppState> for SuperAdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_staff(parts, state, Role::SuperAdmin).await.map(Self)
    }
}
