//! Shop model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Shop, owned 1:1 by a user with the SELLER role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub owner: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Cached mean of review ratings, one decimal place. 0 when unreviewed.
    #[serde(default)]
    pub rating: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Mirrors the owner's seller approval; toggled by the admin verdict
    /// so catalog queries need no join against user_role.
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub approved: bool,
    pub created_at: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: Option<bool>,
}
