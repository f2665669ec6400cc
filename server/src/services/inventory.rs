//! Seller inventory operations
//!
//! Manual stock sets and restocks are expressed as deltas against the
//! current count so they flow through the same ledgered adjustment as
//! order placement.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{PricingUnit, StockChangeType};
use crate::db::repository::{ProductRepository, StockRepository};
use crate::utils::{AppError, AppResult};

/// Set a unit's stock to an absolute level (MANUAL ledger entry). An
/// untracked unit is put under tracking at that level.
pub async fn set_stock(
    db: &Surreal<Db>,
    unit_id: &str,
    target: i64,
    reason: Option<String>,
) -> AppResult<PricingUnit> {
    if target < 0 {
        return Err(AppError::validation("stock must not be negative"));
    }

    let unit = ProductRepository::new(db.clone())
        .find_unit(unit_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Pricing unit {unit_id}")))?;

    let stock = StockRepository::new(db.clone());
    match unit.stock {
        None => Ok(stock.start_tracking(unit_id, target, reason).await?),
        Some(current) if current == target => Ok(unit),
        Some(current) => Ok(stock
            .adjust_tracked(
                unit_id,
                target - current,
                StockChangeType::Manual,
                None,
                reason,
            )
            .await?),
    }
}

/// Add incoming stock to a tracked unit (RESTOCK ledger entry)
pub async fn restock(
    db: &Surreal<Db>,
    unit_id: &str,
    quantity: i64,
    reason: Option<String>,
) -> AppResult<PricingUnit> {
    if quantity < 1 {
        return Err(AppError::validation("Restock quantity must be at least 1"));
    }

    let unit = ProductRepository::new(db.clone())
        .find_unit(unit_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Pricing unit {unit_id}")))?;
    if unit.stock.is_none() {
        return Err(AppError::validation(
            "Unit is not stock-tracked; set a stock level first",
        ));
    }

    Ok(StockRepository::new(db.clone())
        .adjust_tracked(unit_id, quantity, StockChangeType::Restock, None, reason)
        .await?)
}
