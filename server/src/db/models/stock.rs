//! Stock change ledger model
//!
//! Append-only row per inventory mutation. The ledger is the source of
//! truth for stock history; `PricingUnit.stock` is the cached running
//! total.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockChangeType {
    Manual,
    Restock,
    OrderPlaced,
    OrderCancelled,
}

impl StockChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockChangeType::Manual => "MANUAL",
            StockChangeType::Restock => "RESTOCK",
            StockChangeType::OrderPlaced => "ORDER_PLACED",
            StockChangeType::OrderCancelled => "ORDER_CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockChange {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub pricing_unit: RecordId,
    pub change_type: StockChangeType,
    pub delta: i64,
    /// Stock after applying the delta, for the history view
    pub stock_after: Option<i64>,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub order: Option<RecordId>,
    pub reason: Option<String>,
    pub created_at: String,
}

// =============================================================================
// API payloads
// =============================================================================

/// Manual stock set (translated to a delta against current stock)
#[derive(Debug, Deserialize)]
pub struct StockSetPayload {
    pub stock: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestockPayload {
    pub quantity: i64,
    pub reason: Option<String>,
}
