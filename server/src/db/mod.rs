//! Database module
//!
//! Embedded SurrealDB storage. Production runs on RocksDB under
//! `WORK_DIR/database/`; tests run on the in-memory engine.

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "sokoni";
const DATABASE: &str = "marketplace";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the RocksDB-backed database at the given path
    pub async fn new(db_path: &Path) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        Self::finish_init(db).await
    }

    /// In-memory database (tests)
    pub async fn new_memory() -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open memory database: {e}")))?;

        Self::finish_init(db).await
    }

    async fn finish_init(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_schema(&db).await?;

        tracing::info!("Database ready (ns={}, db={})", NAMESPACE, DATABASE);
        Ok(Self { db })
    }
}

/// Apply idempotent schema definitions.
///
/// Tables are schemaless; only the uniqueness constraints the domain
/// depends on are declared (append-once reviews/ratings, one payment and
/// delivery per order, one role row per (user, role), unique emails).
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    const DEFINITIONS: &[&str] = &[
        "DEFINE INDEX IF NOT EXISTS user_email ON user FIELDS email UNIQUE",
        "DEFINE INDEX IF NOT EXISTS user_role_pair ON user_role FIELDS user, role UNIQUE",
        "DEFINE INDEX IF NOT EXISTS shop_owner ON shop FIELDS owner UNIQUE",
        "DEFINE INDEX IF NOT EXISTS payment_order ON payment FIELDS order UNIQUE",
        "DEFINE INDEX IF NOT EXISTS delivery_order ON delivery FIELDS order UNIQUE",
        "DEFINE INDEX IF NOT EXISTS review_order ON review FIELDS order UNIQUE",
        "DEFINE INDEX IF NOT EXISTS rider_rating_delivery ON rider_rating FIELDS delivery UNIQUE",
        "DEFINE INDEX IF NOT EXISTS wishlist_pair ON wishlist FIELDS user, product UNIQUE",
        "DEFINE INDEX IF NOT EXISTS pricing_unit_product ON pricing_unit FIELDS product",
        "DEFINE INDEX IF NOT EXISTS stock_change_unit ON stock_change FIELDS pricing_unit",
        "DEFINE INDEX IF NOT EXISTS notification_user ON notification FIELDS user",
    ];

    for definition in DEFINITIONS {
        db.query(*definition)
            .await
            .map_err(|e| AppError::database(format!("Schema definition failed: {e}")))?;
    }

    Ok(())
}
