//! Stock repository
//!
//! Ledgered inventory mutations. The update of the cached stock count and
//! the ledger append run inside one database transaction; a tracked unit
//! that would go negative aborts the transaction and leaves both untouched.

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{PricingUnit, StockChange, StockChangeType};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const UNIT_TABLE: &str = "pricing_unit";
const ORDER_TABLE: &str = "order";
const SHOP_TABLE: &str = "shop";

const INSUFFICIENT_STOCK: &str = "insufficient stock";

#[derive(Clone)]
pub struct StockRepository {
    base: BaseRepository,
}

impl StockRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Adjust a tracked unit's stock by `delta` and append the ledger row,
    /// atomically. Fails with [`RepoError::Validation`] when the resulting
    /// stock would go negative; the unit is left unchanged.
    pub async fn adjust_tracked(
        &self,
        unit_id: &str,
        delta: i64,
        change_type: StockChangeType,
        order_id: Option<&str>,
        reason: Option<String>,
    ) -> RepoResult<PricingUnit> {
        let unit_rid = parse_record_id(UNIT_TABLE, unit_id)?;
        let order_rid = match order_id {
            Some(o) => Some(parse_record_id(ORDER_TABLE, o)?),
            None => None,
        };

        let result = self
            .base
            .db()
            .query(
                "BEGIN TRANSACTION; \
                 LET $updated = (UPDATE pricing_unit \
                     SET stock = stock + $delta \
                     WHERE id = $unit AND stock != NONE AND stock + $delta >= 0 \
                     RETURN AFTER); \
                 IF array::len($updated) == 0 { THROW 'insufficient stock' }; \
                 CREATE stock_change CONTENT { \
                     pricing_unit: $unit, \
                     change_type: $change_type, \
                     delta: $delta, \
                     stock_after: $updated[0].stock, \
                     order: $order, \
                     reason: $reason, \
                     created_at: $now \
                 }; \
                 RETURN $updated[0]; \
                 COMMIT TRANSACTION;",
            )
            .bind(("unit", unit_rid))
            .bind(("delta", delta))
            .bind(("change_type", change_type))
            .bind(("order", order_rid))
            .bind(("reason", reason))
            .bind(("now", now_rfc3339()))
            .await;

        let mut response = match result {
            Ok(r) => r,
            Err(e) if e.to_string().contains(INSUFFICIENT_STOCK) => {
                return Err(RepoError::Validation(format!(
                    "Insufficient stock for pricing unit {unit_id}"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        // The RETURN collapses the transaction response to a single slot
        let unit = match response.take::<Option<PricingUnit>>(0) {
            Ok(unit) => unit,
            Err(e) if e.to_string().contains(INSUFFICIENT_STOCK) => {
                return Err(RepoError::Validation(format!(
                    "Insufficient stock for pricing unit {unit_id}"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        unit.ok_or_else(|| RepoError::Database("Stock adjustment returned no row".to_string()))
    }

    /// Put an untracked unit under stock tracking at the given level,
    /// ledgering the initial count
    pub async fn start_tracking(
        &self,
        unit_id: &str,
        stock: i64,
        reason: Option<String>,
    ) -> RepoResult<PricingUnit> {
        if stock < 0 {
            return Err(RepoError::Validation("stock must not be negative".into()));
        }
        let unit_rid = parse_record_id(UNIT_TABLE, unit_id)?;

        let mut response = self
            .base
            .db()
            .query(
                "BEGIN TRANSACTION; \
                 LET $updated = (UPDATE pricing_unit SET stock = $stock \
                     WHERE id = $unit AND stock = NONE RETURN AFTER); \
                 IF array::len($updated) == 0 { THROW 'already tracked' }; \
                 CREATE stock_change CONTENT { \
                     pricing_unit: $unit, \
                     change_type: 'MANUAL', \
                     delta: $stock, \
                     stock_after: $stock, \
                     order: NONE, \
                     reason: $reason, \
                     created_at: $now \
                 }; \
                 RETURN $updated[0]; \
                 COMMIT TRANSACTION;",
            )
            .bind(("unit", unit_rid))
            .bind(("stock", stock))
            .bind(("reason", reason))
            .bind(("now", now_rfc3339()))
            .await
            .map_err(|e| {
                if e.to_string().contains("already tracked") {
                    RepoError::Validation(format!("Pricing unit {unit_id} is already tracked"))
                } else {
                    e.into()
                }
            })?;

        // Single slot again: the transaction's RETURN is the whole response
        let unit = match response.take::<Option<PricingUnit>>(0) {
            Ok(unit) => unit,
            Err(e) if e.to_string().contains("already tracked") => {
                return Err(RepoError::Validation(format!(
                    "Pricing unit {unit_id} is already tracked"
                )));
            }
            Err(e) => return Err(e.into()),
        };
        unit.ok_or_else(|| RepoError::Database("Stock tracking returned no row".to_string()))
    }

    /// Ledger-only entry for untracked (null-stock) units
    pub async fn record_untracked(
        &self,
        unit_id: &str,
        delta: i64,
        change_type: StockChangeType,
        order_id: Option<&str>,
        reason: Option<String>,
    ) -> RepoResult<StockChange> {
        let unit_rid = parse_record_id(UNIT_TABLE, unit_id)?;
        let order_rid = match order_id {
            Some(o) => Some(parse_record_id(ORDER_TABLE, o)?),
            None => None,
        };

        let changes: Vec<StockChange> = self
            .base
            .db()
            .query(
                "CREATE stock_change SET \
                 pricing_unit = $unit, \
                 change_type = $change_type, \
                 delta = $delta, \
                 stock_after = NONE, \
                 order = $order, \
                 reason = $reason, \
                 created_at = $now",
            )
            .bind(("unit", unit_rid))
            .bind(("change_type", change_type))
            .bind(("delta", delta))
            .bind(("order", order_rid))
            .bind(("reason", reason))
            .bind(("now", now_rfc3339()))
            .await?
            .take(0)?;
        changes
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to append stock change".to_string()))
    }

    /// Pricing units at or below their low-stock threshold, across all of
    /// a shop's products
    pub async fn low_stock(&self, shop_id: &str) -> RepoResult<Vec<PricingUnit>> {
        let shop_rid = parse_record_id(SHOP_TABLE, shop_id)?;
        let units: Vec<PricingUnit> = self
            .base
            .db()
            .query(
                "SELECT * FROM pricing_unit \
                 WHERE product.shop = $shop AND is_active = true \
                 AND stock != NONE AND stock <= low_stock_threshold \
                 ORDER BY stock",
            )
            .bind(("shop", shop_rid))
            .await?
            .take(0)?;
        Ok(units)
    }

    /// Stock change history for a pricing unit, newest first
    pub async fn history(&self, unit_id: &str) -> RepoResult<Vec<StockChange>> {
        let unit_rid = parse_record_id(UNIT_TABLE, unit_id)?;
        let changes: Vec<StockChange> = self
            .base
            .db()
            .query(
                "SELECT * FROM stock_change \
                 WHERE pricing_unit = $unit ORDER BY created_at DESC",
            )
            .bind(("unit", unit_rid))
            .await?
            .take(0)?;
        Ok(changes)
    }
}
