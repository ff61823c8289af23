mod admin;
mod analytics;
mod auth;
mod devices;
mod disputes;
pub mod dto;
mod health;
mod orders;
mod sessions;
mod social_accounts;
mod tasks;
mod transactions;
mod users;

use axum::Router;
use axum::http::HeaderMap;

use crate::auth::{extract_client_ip, extract_user_agent};
use crate::services::ClientInfo;
use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health`: liveness probe
/// - `GET /api/health`: readiness with database connectivity
/// - `/api/auth`, `/api/users`, `/api/sessions`: accounts and sign-in
/// - `/api/transactions`, `/api/analytics`: wallet and ledger views
/// - `/api/orders`, `/api/tasks`: engagement marketplace
/// - `/api/devices`, `/api/social-accounts`, `/api/disputes`: user resources
/// - `/api/admin`: operator panel, admin-scope sessions only
pub fn router() -> Router<AppState> {
    let api = Router::new()
        .merge(health::api_router())
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/sessions", sessions::router())
        .nest("/transactions", transactions::router())
        .nest("/analytics", analytics::router())
        .nest("/orders", orders::router())
        .nest("/tasks", tasks::router())
        .nest("/devices", devices::router())
        .nest("/social-accounts", social_accounts::router())
        .nest("/disputes", disputes::router())
        .nest("/admin", admin::router());

    Router::new()
        .merge(health::root_router())
        .nest("/api", api)
}

/// Request metadata recorded on new sessions.
fn client_info(headers: &HeaderMap) -> ClientInfo {
    ClientInfo {
        ip_address: extract_client_ip(headers),
        user_agent: extract_user_agent(headers),
    }
}
