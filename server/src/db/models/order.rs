//! Order model and status state machine
//!
//! The transition table lives here, on the enum, and every mutating
//! endpoint (single, bulk, webhook, delivery sync, dispute) goes through
//! it so illegal transitions are rejected uniformly.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
    Disputed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Disputed => "DISPUTED",
        }
    }

    /// Transitions a seller may apply manually (single or bulk update).
    ///
    /// DELIVERED only comes from delivery confirmation, CANCELLED from the
    /// buyer-cancel or dispute-resolution pathways, DISPUTED from a buyer
    /// dispute. None of those are seller-drivable.
    pub fn seller_can_transition(self, target: OrderStatus) -> bool {
        matches!(
            (self, target),
            (OrderStatus::Pending, OrderStatus::Preparing)
                | (OrderStatus::Paid, OrderStatus::Preparing)
                | (OrderStatus::Preparing, OrderStatus::OutForDelivery)
        )
    }

    /// Whether the buyer may still cancel. Only unpaid orders qualify;
    /// anything later goes through the dispute pathway.
    pub fn buyer_can_cancel(self) -> bool {
        self == OrderStatus::Pending
    }

    /// Whether a dispute can be opened (post-delivery only)
    pub fn can_dispute(self) -> bool {
        self == OrderStatus::Delivered
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order line item (embedded in the order document)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub pricing_unit: RecordId,
    /// Denormalized at checkout so the order survives catalog edits
    pub name: String,
    pub unit: String,
    /// Unit price in minor currency units, captured at checkout
    pub price: i64,
    pub quantity: i64,
    pub line_total: i64,
}

/// Order aggregate: line items against a single shop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub buyer: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub shop: RecordId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    /// Sum of line totals, minor currency units
    pub total: i64,
    /// Marketplace cut, subtracted before seller payout
    pub platform_fee: i64,
    pub delivery_fee: i64,
    /// Destination coordinates, used for the delivery fee quote
    pub dest_latitude: Option<f64>,
    pub dest_longitude: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

// =============================================================================
// API payloads
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub pricing_unit: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutPayload {
    pub shop: String,
    pub items: Vec<CheckoutItem>,
    pub dest_latitude: Option<f64>,
    pub dest_longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct BulkOrderStatusUpdate {
    pub order_ids: Vec<String>,
    pub status: OrderStatus,
}

/// Result of a bulk status update
#[derive(Debug, Serialize)]
pub struct BulkUpdateResult {
    pub updated: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn seller_transition_table() {
        assert!(Pending.seller_can_transition(Preparing));
        assert!(Paid.seller_can_transition(Preparing));
        assert!(Preparing.seller_can_transition(OutForDelivery));

        // delivery-confirmation and dispute pathways are not seller-drivable
        assert!(!OutForDelivery.seller_can_transition(Delivered));
        assert!(!Paid.seller_can_transition(Cancelled));
        assert!(!Delivered.seller_can_transition(Disputed));
        // no reverse transitions
        assert!(!Preparing.seller_can_transition(Paid));
        assert!(!OutForDelivery.seller_can_transition(Preparing));
    }

    #[test]
    fn buyer_cancel_only_while_pending() {
        assert!(Pending.buyer_can_cancel());
        assert!(!Paid.buyer_can_cancel());
        assert!(!Delivered.buyer_can_cancel());
    }

    #[test]
    fn dispute_only_after_delivery() {
        assert!(Delivered.can_dispute());
        assert!(!OutForDelivery.can_dispute());
        assert!(!Cancelled.can_dispute());
    }
}
