//! Product and pricing unit models

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Product categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Produce,
    Grains,
    Meat,
    Seafood,
    Dairy,
    Beverages,
    Household,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "PRODUCE",
            Category::Grains => "GRAINS",
            Category::Meat => "MEAT",
            Category::Seafood => "SEAFOOD",
            Category::Dairy => "DAIRY",
            Category::Beverages => "BEVERAGES",
            Category::Household => "HOUSEHOLD",
            Category::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PRODUCE" => Some(Category::Produce),
            "GRAINS" => Some(Category::Grains),
            "MEAT" => Some(Category::Meat),
            "SEAFOOD" => Some(Category::Seafood),
            "DAIRY" => Some(Category::Dairy),
            "BEVERAGES" => Some(Category::Beverages),
            "HOUSEHOLD" => Some(Category::Household),
            "OTHER" => Some(Category::Other),
            _ => None,
        }
    }
}

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Record link to the owning shop
    #[serde(with = "serde_helpers::record_id")]
    pub shop: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    /// External image URLs
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_available: bool,
    pub created_at: String,
}

fn default_true() -> bool {
    true
}

/// Sellable unit/price combination for a product (e.g. "1kg" at price X).
/// Stored in its own table so stock updates are per-row and atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingUnit {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    /// Unit label, e.g. "1kg", "crate", "500ml"
    pub unit: String,
    /// Price in minor currency units
    pub price: i64,
    /// Remaining stock; null = untracked/unlimited. Never negative once set.
    pub stock: Option<i64>,
    #[serde(default = "default_low_stock")]
    pub low_stock_threshold: i64,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
}

fn default_low_stock() -> i64 {
    5
}

// =============================================================================
// API payloads
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PricingUnitInput {
    pub unit: String,
    pub price: i64,
    pub stock: Option<i64>,
    pub low_stock_threshold: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub images: Option<Vec<String>>,
    pub is_available: Option<bool>,
    pub pricing_units: Vec<PricingUnitInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub images: Option<Vec<String>>,
    pub is_available: Option<bool>,
}

/// Product plus its pricing units, as returned by catalog endpoints
#[derive(Debug, Serialize)]
pub struct ProductFull {
    #[serde(flatten)]
    pub product: Product,
    pub pricing_units: Vec<PricingUnit>,
}
