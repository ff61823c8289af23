//! Periodic housekeeping: expired sessions and order statistics.

use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::services::{OrderStatisticsService, SessionService};

/// What one maintenance pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub sessions_purged: u64,
    pub users_recalculated: u64,
}

/// Run every housekeeping step once.
///
/// # Errors
///
/// Returns the first failing step's error.
pub async fn run_once(db: &DatabaseConnection) -> Result<MaintenanceReport, AppError> {
    let sessions_purged = SessionService::purge_expired(db).await?;
    let users_recalculated = OrderStatisticsService::recalculate_all(db).await?;
    Ok(MaintenanceReport {
        sessions_purged,
        users_recalculated,
    })
}

/// Spawn the housekeeping loop. Returns `None` when `interval_secs` is zero.
#[must_use]
pub fn spawn(db: DatabaseConnection, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("Maintenance job disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match run_once(&db).await {
                Ok(report) => tracing::info!(
                    sessions_purged = report.sessions_purged,
                    users_recalculated = report.users_recalculated,
                    "Maintenance pass finished"
                ),
                Err(AppError::Internal(err)) => {
                    tracing::error!("Maintenance pass failed: {err:#}");
                }
                Err(other) => tracing::error!("Maintenance pass failed: {other:?}"),
            }
        }
    }))
}
