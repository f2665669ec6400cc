//! Seller-side order status updates
//!
//! Single and bulk transitions through the order status table, with
//! buyer notifications on success. Bulk updates are per-order: each one
//! either applies or is counted as skipped, never all-or-nothing.

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;
use tracing::info;

use crate::db::models::{BulkUpdateResult, NotificationType, Order, OrderStatus};
use crate::db::repository::OrderRepository;
use crate::services::notifier;
use crate::utils::{AppError, AppResult};

/// Apply one seller-driven transition to an order of the given shop.
pub async fn seller_update_status(
    db: &Surreal<Db>,
    shop_id: &RecordId,
    order_id: &str,
    target: OrderStatus,
) -> AppResult<Order> {
    let orders = OrderRepository::new(db.clone());
    let order = orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

    if &order.shop != shop_id {
        return Err(AppError::forbidden("Order belongs to another shop"));
    }
    if !order.status.seller_can_transition(target) {
        return Err(AppError::validation(format!(
            "Cannot move a {} order to {}",
            order.status.as_str(),
            target.as_str()
        )));
    }

    let updated = orders
        .transition(order_id, order.status, target)
        .await?
        .ok_or_else(|| AppError::conflict("Order changed concurrently, retry"))?;

    notifier::notify(
        db,
        &updated.buyer,
        NotificationType::OrderStatus,
        "Order update",
        format!("Your order {order_id} is now {}", target.as_str()),
        Some(format!("/orders/{order_id}")),
    )
    .await;

    info!(target: "orders", order = %order_id, status = %target.as_str(), "Order status updated");
    Ok(updated)
}

/// Bulk variant: returns how many orders moved and how many were skipped
/// (missing, foreign, illegal transition, or raced).
pub async fn seller_bulk_update(
    db: &Surreal<Db>,
    shop_id: &RecordId,
    order_ids: &[String],
    target: OrderStatus,
) -> AppResult<BulkUpdateResult> {
    let mut updated = 0;
    let mut skipped = 0;

    for order_id in order_ids {
        match seller_update_status(db, shop_id, order_id, target).await {
            Ok(_) => updated += 1,
            Err(AppError::Database(msg)) => return Err(AppError::Database(msg)),
            Err(_) => skipped += 1,
        }
    }

    Ok(BulkUpdateResult { updated, skipped })
}
