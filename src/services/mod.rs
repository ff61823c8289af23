//! Domain services. Each wraps one or two entities; handlers stay thin.

mod analytics_service;
mod auth_service;
mod device_service;
mod dispute_service;
mod order_service;
mod order_statistics_service;
pub mod pricing;
mod session_service;
mod setting_service;
mod social_account_service;
mod task_service;
mod transaction_service;
mod user_service;

pub use analytics_service::{
    AnalyticsService, BalancePoint, KindTotal, RefundSummary, TransactionSummary,
    WithdrawalSummary,
};
pub use auth_service::{AuthOutcome, AuthService, RegisterInput};
pub use device_service::{DeviceService, RegisterDevice};
pub use dispute_service::{DisputeService, OpenDispute};
pub use order_service::{CreateOrder, OrderFilter, OrderOverview, OrderService};
pub use order_statistics_service::OrderStatisticsService;
pub use session_service::{ClientInfo, SessionService};
pub use setting_service::{EffectiveSetting, SettingKey, SettingService};
pub use social_account_service::{
    CreateSocialAccount, SocialAccountService, SocialAccountStats, UpdateSocialAccount,
};
pub use task_service::TaskService;
pub use transaction_service::{
    LedgerEntry, Reconciliation, TransactionFilter, TransactionService, WithdrawalRequest,
};
pub use user_service::{UserFilter, UserService};

use crate::error::AppError;

/// Largest page a list endpoint will return.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Widest free-text reason stored with a status change.
pub const MAX_REASON_LEN: usize = 400;

/// Trim a free-text reason. Blank input becomes `None`.
///
/// # Errors
///
/// Returns a validation error when the reason is longer than [`MAX_REASON_LEN`].
pub fn clean_reason(raw: Option<&str>) -> Result<Option<String>, AppError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) if r.chars().count() > MAX_REASON_LEN => Err(AppError::Validation(vec![
            format!("Reason must be at most {MAX_REASON_LEN} characters."),
        ])),
        other => Ok(other.map(str::to_string)),
    }
}

/// Offset/limit window requested by a list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub offset: u64,
    pub limit: u64,
}

impl PageParams {
    /// Clamp the limit to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(offset: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_clamp() {
        assert_eq!(PageParams::new(None, None), PageParams { offset: 0, limit: 20 });
        assert_eq!(PageParams::new(Some(5), Some(0)).limit, 1);
        assert_eq!(PageParams::new(None, Some(10_000)).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn reasons_are_trimmed_and_bounded() {
        assert_eq!(clean_reason(None).ok(), Some(None));
        assert_eq!(clean_reason(Some("   ")).ok(), Some(None));
        assert_eq!(
            clean_reason(Some("  spam  ")).ok(),
            Some(Some("spam".to_string()))
        );
        let long = "x".repeat(MAX_REASON_LEN + 1);
        assert!(clean_reason(Some(&long)).is_err());
        assert!(clean_reason(Some(&long[1..])).is_ok());
    }

    #[test]
    fn page_map_keeps_window() {
        let page = Page {
            items: vec![1, 2, 3],
            total: 10,
            offset: 3,
            limit: 3,
        }
        .map(|n| n * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!((page.total, page.offset, page.limit), (10, 3, 3));
    }
}
