//! Response bodies shared by the user and admin route groups.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::entities::device::DeviceType;
use crate::entities::dispute::DisputeStatus;
use crate::entities::order::{OrderStatus, ServiceType};
use crate::entities::order_statistic::Timeframe;
use crate::entities::task::{TaskStatus, TaskType};
use crate::entities::transaction::{TransactionKind, TransactionStatus};
use crate::entities::user::{AccountStatus, Role, UserMode};
use crate::entities::{
    Platform, device, dispute, order, order_statistic, session, social_account, task,
    transaction, user,
};
use crate::services::{EffectiveSetting, Page};

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn from_page<M>(page: Page<M>, f: impl FnMut(M) -> T) -> Self {
        let page = page.map(f);
        Self {
            data: page.items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub balance: i64,
    pub mode: UserMode,
    pub account_status: AccountStatus,
    pub suspension_reason: Option<String>,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            role: u.role,
            balance: u.balance,
            mode: u.mode,
            account_status: u.account_status,
            suspension_reason: u.suspension_reason,
            last_login_at: u.last_login_at.map(|t| t.to_rfc3339()),
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
    pub last_seen_at: String,
    pub expires_at: String,
    pub current: bool,
}

impl SessionResponse {
    pub fn new(s: session::Model, current_id: Uuid) -> Self {
        Self {
            current: s.id == current_id,
            id: s.id,
            ip_address: s.ip_address,
            user_agent: s.user_agent,
            created_at: s.created_at.to_rfc3339(),
            last_seen_at: s.last_seen_at.to_rfc3339(),
            expires_at: s.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: Platform,
    pub service_type: ServiceType,
    pub target_url: String,
    pub quantity: i32,
    pub remaining_count: i32,
    pub delivered: i32,
    /// Whole percent delivered.
    pub progress: i32,
    pub unit_price: i64,
    pub amount: i64,
    pub status: OrderStatus,
    pub rejection_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl From<order::Model> for OrderResponse {
    fn from(o: order::Model) -> Self {
        let delivered = o.delivered();
        let progress = if o.quantity > 0 {
            delivered * 100 / o.quantity
        } else {
            0
        };
        Self {
            id: o.id,
            user_id: o.user_id,
            platform: o.platform,
            service_type: o.service_type,
            target_url: o.target_url,
            quantity: o.quantity,
            remaining_count: o.remaining_count,
            delivered,
            progress,
            unit_price: o.unit_price,
            amount: o.amount,
            status: o.status,
            rejection_reason: o.rejection_reason,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
            completed_at: o.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub social_account_id: Option<Uuid>,
    pub platform: Platform,
    pub task_type: TaskType,
    pub target_url: String,
    pub reward: i64,
    pub status: TaskStatus,
    pub proof: Option<String>,
    pub rejection_reason: Option<String>,
    pub claimed_at: Option<String>,
    pub completed_at: Option<String>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
}

impl From<task::Model> for TaskResponse {
    fn from(t: task::Model) -> Self {
        Self {
            id: t.id,
            order_id: t.order_id,
            assignee_id: t.assignee_id,
            social_account_id: t.social_account_id,
            platform: t.platform,
            task_type: t.task_type,
            target_url: t.target_url,
            reward: t.reward,
            status: t.status,
            proof: t.proof,
            rejection_reason: t.rejection_reason,
            claimed_at: t.claimed_at.map(|v| v.to_rfc3339()),
            completed_at: t.completed_at.map(|v| v.to_rfc3339()),
            reviewed_at: t.reviewed_at.map(|v| v.to_rfc3339()),
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub kind: TransactionKind,
    pub amount: i64,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub payout_method: Option<String>,
    pub payout_destination: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<transaction::Model> for TransactionResponse {
    fn from(t: transaction::Model) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            order_id: t.order_id,
            task_id: t.task_id,
            kind: t.kind,
            amount: t.amount,
            status: t.status,
            description: t.description,
            payout_method: t.payout_method,
            payout_destination: t.payout_destination,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: Uuid,
    pub name: String,
    pub device_type: DeviceType,
    pub device_identifier: String,
    pub settings: Value,
    pub is_active: bool,
    pub last_active_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<device::Model> for DeviceResponse {
    fn from(d: device::Model) -> Self {
        Self {
            id: d.id,
            name: d.name,
            device_type: d.device_type,
            device_identifier: d.device_identifier,
            settings: d.settings,
            is_active: d.is_active,
            last_active_at: d.last_active_at.map(|t| t.to_rfc3339()),
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialAccountResponse {
    pub id: Uuid,
    pub platform: Platform,
    pub username: String,
    pub external_id: Option<String>,
    pub has_access_token: bool,
    pub is_active: bool,
    pub follows_count: i64,
    pub likes_count: i64,
    pub views_count: i64,
    pub subscriptions_count: i64,
    pub tasks_completed: i64,
    pub last_activity_at: Option<String>,
    pub created_at: String,
}

impl From<social_account::Model> for SocialAccountResponse {
    fn from(a: social_account::Model) -> Self {
        Self {
            id: a.id,
            platform: a.platform,
            username: a.username,
            external_id: a.external_id,
            has_access_token: a.access_token.is_some(),
            is_active: a.is_active,
            follows_count: a.follows_count,
            likes_count: a.likes_count,
            views_count: a.views_count,
            subscriptions_count: a.subscriptions_count,
            tasks_completed: a.tasks_completed,
            last_activity_at: a.last_activity_at.map(|t| t.to_rfc3339()),
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Uuid,
    pub reason: String,
    pub description: String,
    pub status: DisputeStatus,
    pub resolution: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
    pub resolved_at: Option<String>,
}

impl From<dispute::Model> for DisputeResponse {
    fn from(d: dispute::Model) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            order_id: d.order_id,
            reason: d.reason,
            description: d.description,
            status: d.status,
            resolution: d.resolution,
            resolved_by: d.resolved_by,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
            resolved_at: d.resolved_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatisticResponse {
    pub platform: Platform,
    pub timeframe: Timeframe,
    pub total_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    pub total_spent: i64,
    pub total_quantity: i64,
    pub delivered_quantity: i64,
    pub calculated_at: String,
}

impl From<order_statistic::Model> for OrderStatisticResponse {
    fn from(s: order_statistic::Model) -> Self {
        Self {
            platform: s.platform,
            timeframe: s.timeframe,
            total_orders: s.total_orders,
            completed_orders: s.completed_orders,
            cancelled_orders: s.cancelled_orders,
            total_spent: s.total_spent,
            total_quantity: s.total_quantity,
            delivered_quantity: s.delivered_quantity,
            calculated_at: s.calculated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingResponse {
    pub key: &'static str,
    pub value: String,
    pub description: &'static str,
    pub is_default: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<String>,
}

impl From<EffectiveSetting> for SettingResponse {
    fn from(s: EffectiveSetting) -> Self {
        Self {
            key: s.key.as_str(),
            value: s.value,
            description: s.key.description(),
            is_default: s.stored.is_none(),
            updated_by: s.stored.as_ref().and_then(|row| row.updated_by),
            updated_at: s.stored.map(|row| row.updated_at.to_rfc3339()),
        }
    }
}
