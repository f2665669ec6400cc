//! Repository module
//!
//! CRUD and query operations per SurrealDB table. Multi-entity flows
//! (checkout, escrow release, assignment) live in `services/` and compose
//! these repositories.

// Identity
pub mod user;

// Catalog
pub mod product;
pub mod shop;

// Inventory
pub mod stock;

// Orders / payments / deliveries
pub mod delivery;
pub mod order;
pub mod payment;

// Feedback
pub mod review;

// Side channels
pub mod notification;
pub mod token;
pub mod wishlist;

// Admin
pub mod stats;

// Re-exports
pub use delivery::DeliveryRepository;
pub use notification::NotificationRepository;
pub use order::OrderRepository;
pub use payment::PaymentRepository;
pub use product::ProductRepository;
pub use review::{ReviewRepository, RiderRatingRepository};
pub use shop::ShopRepository;
pub use stats::StatsRepository;
pub use stock::StockRepository;
pub use token::TokenRepository;
pub use user::{UserRepository, UserRoleRepository};
pub use wishlist::WishlistRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // Unique index violations surface as duplicates, not storage faults
        if msg.contains("already contains") || msg.contains("index `") && msg.contains("unique") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID convention: "table:id" strings across the whole stack
// =============================================================================
//
// surrealdb::RecordId handles all ids:
//   - parse:   let id: RecordId = "product:abc".parse()?;
//   - build:   RecordId::from_table_key("product", "abc")
//   - CRUD:    db.select(id) / db.delete(id) take a RecordId directly

/// Parse a "table:id" string, checking the table prefix
pub fn parse_record_id(table: &str, id: &str) -> RepoResult<surrealdb::RecordId> {
    let rid: surrealdb::RecordId = if id.contains(':') {
        id.parse()
            .map_err(|_| RepoError::Validation(format!("Invalid id: {id}")))?
    } else {
        surrealdb::RecordId::from_table_key(table, id)
    };

    if rid.table() != table {
        return Err(RepoError::Validation(format!(
            "Expected a {table} id, got: {id}"
        )));
    }
    Ok(rid)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// RFC 3339 timestamp for model fields
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
