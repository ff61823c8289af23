//! Price list for engagement services, in cents.

use serde::Serialize;

use crate::entities::Platform;
use crate::entities::order::ServiceType;

/// What a buyer pays per unit and what a task-doer earns for delivering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    pub unit_price: i64,
    pub task_reward: i64,
}

/// `None` when the platform does not offer the service.
#[must_use]
pub const fn quote(platform: Platform, service: ServiceType) -> Option<Rate> {
    let (unit_price, task_reward) = match (platform, service) {
        (Platform::Instagram, ServiceType::Likes) => (2, 1),
        (Platform::Instagram, ServiceType::Followers) => (5, 3),
        (Platform::Instagram, ServiceType::Views) => (1, 1),
        (Platform::Youtube, ServiceType::Likes) => (3, 2),
        (Platform::Youtube, ServiceType::Views) => (2, 1),
        (Platform::Youtube, ServiceType::Subscribers) => (10, 6),
        (Platform::Instagram, ServiceType::Subscribers)
        | (Platform::Youtube, ServiceType::Followers) => return None,
    };
    Some(Rate {
        unit_price,
        task_reward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_combinations() {
        assert_eq!(quote(Platform::Instagram, ServiceType::Subscribers), None);
        assert_eq!(quote(Platform::Youtube, ServiceType::Followers), None);
    }

    #[test]
    fn rewards_never_exceed_price() {
        for platform in [Platform::Instagram, Platform::Youtube] {
            for service in [
                ServiceType::Likes,
                ServiceType::Followers,
                ServiceType::Views,
                ServiceType::Subscribers,
            ] {
                if let Some(rate) = quote(platform, service) {
                    assert!(rate.task_reward > 0);
                    assert!(rate.task_reward <= rate.unit_price, "{platform:?} {service:?}");
                }
            }
        }
    }
}
