//! Delivery model and status progression

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Assigned => "ASSIGNED",
            DeliveryStatus::PickedUp => "PICKED_UP",
            DeliveryStatus::InTransit => "IN_TRANSIT",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Failed => "FAILED",
        }
    }

    fn rank(self) -> u8 {
        match self {
            DeliveryStatus::Pending => 0,
            DeliveryStatus::Assigned => 1,
            DeliveryStatus::PickedUp => 2,
            DeliveryStatus::InTransit => 3,
            DeliveryStatus::Delivered => 4,
            DeliveryStatus::Failed => 5,
        }
    }

    /// Rider progression is linear and advance-only:
    /// ASSIGNED → PICKED_UP → IN_TRANSIT → DELIVERED, one step at a time.
    /// FAILED is allowed from any post-assignment, non-final state.
    pub fn rider_can_advance_to(self, target: DeliveryStatus) -> bool {
        if target == DeliveryStatus::Failed {
            return matches!(
                self,
                DeliveryStatus::Assigned | DeliveryStatus::PickedUp | DeliveryStatus::InTransit
            );
        }
        self.rank() >= DeliveryStatus::Assigned.rank()
            && target.rank() <= DeliveryStatus::Delivered.rank()
            && target.rank() == self.rank() + 1
    }

    pub fn is_final(self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Failed)
    }
}

/// One delivery per order, created when the order is paid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub order: RecordId,
    /// Set iff status >= ASSIGNED
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub rider: Option<RecordId>,
    pub status: DeliveryStatus,
    pub assigned_at: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: String,
}

// =============================================================================
// API payloads
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AssignRiderPayload {
    pub rider: String,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryStatusUpdate {
    pub status: DeliveryStatus,
}

#[cfg(test)]
mod tests {
    use super::DeliveryStatus::*;

    #[test]
    fn linear_advance_only() {
        assert!(Assigned.rider_can_advance_to(PickedUp));
        assert!(PickedUp.rider_can_advance_to(InTransit));
        assert!(InTransit.rider_can_advance_to(Delivered));

        // no skipping, no reversing, no leaving final states
        assert!(!Assigned.rider_can_advance_to(InTransit));
        assert!(!InTransit.rider_can_advance_to(PickedUp));
        assert!(!Delivered.rider_can_advance_to(Failed));
        assert!(!Pending.rider_can_advance_to(PickedUp));
    }

    #[test]
    fn failed_from_any_active_state() {
        assert!(Assigned.rider_can_advance_to(Failed));
        assert!(PickedUp.rider_can_advance_to(Failed));
        assert!(InTransit.rider_can_advance_to(Failed));
        assert!(!Pending.rider_can_advance_to(Failed));
    }
}
