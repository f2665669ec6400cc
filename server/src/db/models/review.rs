//! Review and rider rating models
//!
//! Both are append-once: one review per order, one rating per delivery,
//! enforced by a lookup before insert.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Shop-level review, tied to one delivered order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub order: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub shop: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub buyer: RecordId,
    /// Bounded [1, 5] at submission
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

/// Rider-level rating, tied to one completed delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderRating {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub delivery: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub rider: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub buyer: RecordId,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

// =============================================================================
// API payloads
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ReviewCreate {
    pub order: String,
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RiderRatingCreate {
    pub delivery: String,
    pub rating: i64,
    pub comment: Option<String>,
}
