//! Notification model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    OrderStatus,
    DeliveryAssigned,
    DeliveryCompleted,
    EscrowReleased,
    RoleApplication,
    Dispute,
}

/// Side-channel message created on state transitions, read by the
/// affected user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}
