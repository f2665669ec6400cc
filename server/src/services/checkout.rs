//! Checkout, buyer cancellation and disputes
//!
//! Checkout validates every line against the live catalog, snapshots
//! names and prices into the order, decrements tracked stock through the
//! ledger and opens a PENDING payment for the gateway to settle.

use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::{
    CheckoutPayload, NotificationType, Order, OrderItem, OrderStatus, Payment, StockChangeType,
};
use crate::db::repository::{
    OrderRepository, PaymentRepository, ProductRepository, RepoError, ShopRepository,
    StockRepository, parse_record_id,
};
use crate::services::{delivery_fee, notifier};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct CheckoutResult {
    pub order: Order,
    pub payment: Payment,
}

/// Create an order from a cart against a single shop.
pub async fn checkout(
    db: &Surreal<Db>,
    buyer_id: &str,
    payload: CheckoutPayload,
    platform_fee_bps: i64,
    default_delivery_fee: i64,
) -> AppResult<CheckoutResult> {
    if payload.items.is_empty() {
        return Err(AppError::validation("Cart is empty"));
    }
    if payload.items.iter().any(|i| i.quantity < 1) {
        return Err(AppError::validation("Quantities must be at least 1"));
    }

    let shops = ShopRepository::new(db.clone());
    let shop = shops
        .find_by_id(&payload.shop)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Shop {}", payload.shop)))?;
    if !shop.is_active || !shop.approved {
        return Err(AppError::validation("Shop is not accepting orders"));
    }
    let shop_rid = shop
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Shop record has no id"))?;

    // Validate lines and snapshot catalog data into order items
    let products = ProductRepository::new(db.clone());
    let mut items: Vec<OrderItem> = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let unit = products
            .find_unit(&line.pricing_unit)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Pricing unit {}", line.pricing_unit)))?;
        if !unit.is_active {
            return Err(AppError::validation(format!(
                "Pricing unit {} is no longer sold",
                line.pricing_unit
            )));
        }

        let product = products
            .find_by_id(&unit.product.to_string())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {}", unit.product)))?;
        if product.shop != shop_rid {
            return Err(AppError::validation(
                "All items must belong to the same shop",
            ));
        }
        if !product.is_available {
            return Err(AppError::validation(format!(
                "{} is currently unavailable",
                product.name
            )));
        }
        if let Some(stock) = unit.stock {
            if stock < line.quantity {
                return Err(AppError::validation(format!(
                    "Insufficient stock for {} ({})",
                    product.name, unit.unit
                )));
            }
        }

        let unit_rid = unit
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Pricing unit record has no id"))?;
        items.push(OrderItem {
            product: unit.product.clone(),
            pricing_unit: unit_rid,
            name: product.name,
            unit: unit.unit,
            price: unit.price,
            quantity: line.quantity,
            line_total: unit.price * line.quantity,
        });
    }

    let total: i64 = items.iter().map(|i| i.line_total).sum();
    let platform_fee = total * platform_fee_bps / 10_000;
    let fee_quote = delivery_fee::quote(
        (shop.latitude, shop.longitude),
        (payload.dest_latitude, payload.dest_longitude),
        default_delivery_fee,
    );

    let orders = OrderRepository::new(db.clone());
    let order = orders
        .create(
            buyer_id,
            &shop_rid,
            items,
            total,
            platform_fee,
            fee_quote.delivery_fee,
            payload.dest_latitude,
            payload.dest_longitude,
        )
        .await?;
    let order_rid = order
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Created order has no id"))?;
    let order_id = order_rid.to_string();

    // Decrement stock per line, ledgered against the order. A line losing
    // a stock race aborts checkout: put back what was taken and cancel
    // the shell order.
    if let Err((applied, e)) =
        apply_stock(db, &order.items, &order_id, -1, StockChangeType::OrderPlaced).await
    {
        restore_stock(db, &order.items[..applied], &order_id).await;
        let _ = orders
            .transition(&order_id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await;
        return Err(e);
    }

    // Grand total charged to the buyer: items plus delivery
    let reference = format!("PAY-{}", Uuid::new_v4());
    let payment = PaymentRepository::new(db.clone())
        .create(&order_rid, reference, total + fee_quote.delivery_fee)
        .await?;

    info!(
        target: "checkout",
        order = %order_id,
        total = total,
        "Order placed"
    );
    Ok(CheckoutResult { order, payment })
}

/// Cancel a PENDING order, restoring stock and voiding the payment.
pub async fn cancel(db: &Surreal<Db>, buyer_id: &str, order_id: &str) -> AppResult<Order> {
    let orders = OrderRepository::new(db.clone());
    let order = orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

    if order.buyer != parse_record_id("user", buyer_id)? {
        return Err(AppError::forbidden("Not your order"));
    }
    if !order.status.buyer_can_cancel() {
        return Err(AppError::validation(format!(
            "A {} order cannot be cancelled",
            order.status.as_str()
        )));
    }

    let cancelled = orders
        .transition(order_id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await?
        .ok_or_else(|| AppError::conflict("Order is no longer cancellable"))?;

    restore_stock(db, &cancelled.items, order_id).await;

    let payments = PaymentRepository::new(db.clone());
    if let Some(payment) = payments.find_by_order(order_id).await? {
        let _ = payments.mark_failed(&payment.reference).await?;
    }

    if let Ok(Some(shop)) = ShopRepository::new(db.clone())
        .find_by_id(&cancelled.shop.to_string())
        .await
    {
        notifier::notify(
            db,
            &shop.owner,
            NotificationType::OrderStatus,
            "Order cancelled",
            format!("Order {order_id} was cancelled by the buyer"),
            Some(format!("/seller/orders/{order_id}")),
        )
        .await;
    }

    info!(target: "checkout", order = %order_id, "Order cancelled by buyer");
    Ok(cancelled)
}

/// Open a dispute on a delivered order. Funds stay in escrow until an
/// admin resolves it.
pub async fn dispute(db: &Surreal<Db>, buyer_id: &str, order_id: &str) -> AppResult<Order> {
    let orders = OrderRepository::new(db.clone());
    let order = orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

    if order.buyer != parse_record_id("user", buyer_id)? {
        return Err(AppError::forbidden("Not your order"));
    }
    if !order.status.can_dispute() {
        return Err(AppError::validation(
            "Only delivered orders can be disputed",
        ));
    }

    let disputed = orders
        .transition(order_id, OrderStatus::Delivered, OrderStatus::Disputed)
        .await?
        .ok_or_else(|| AppError::conflict("Order is no longer disputable"))?;

    if let Ok(Some(shop)) = ShopRepository::new(db.clone())
        .find_by_id(&disputed.shop.to_string())
        .await
    {
        notifier::notify(
            db,
            &shop.owner,
            NotificationType::Dispute,
            "Order disputed",
            format!("The buyer opened a dispute on order {order_id}"),
            Some(format!("/seller/orders/{order_id}")),
        )
        .await;
    }

    info!(target: "checkout", order = %order_id, "Dispute opened");
    Ok(disputed)
}

/// Apply `sign * quantity` per item; tracked units go through the
/// ledgered adjustment, untracked ones get a ledger-only row. On failure
/// returns how many items had already been applied.
async fn apply_stock(
    db: &Surreal<Db>,
    items: &[OrderItem],
    order_id: &str,
    sign: i64,
    change_type: StockChangeType,
) -> Result<(), (usize, AppError)> {
    let stock = StockRepository::new(db.clone());
    let products = ProductRepository::new(db.clone());

    for (applied, item) in items.iter().enumerate() {
        let unit_id = item.pricing_unit.to_string();
        let delta = sign * item.quantity;

        let tracked = products
            .find_unit(&unit_id)
            .await
            .map_err(|e| (applied, AppError::from(e)))?
            .is_some_and(|u| u.stock.is_some());
        let result = if tracked {
            stock
                .adjust_tracked(&unit_id, delta, change_type, Some(order_id), None)
                .await
                .map(|_| ())
        } else {
            stock
                .record_untracked(&unit_id, delta, change_type, Some(order_id), None)
                .await
                .map(|_| ())
        };

        if let Err(e) = result {
            let err = match e {
                RepoError::Validation(_) => AppError::validation(format!(
                    "Insufficient stock for {} ({})",
                    item.name, item.unit
                )),
                other => other.into(),
            };
            return Err((applied, err));
        }
    }
    Ok(())
}

/// Best-effort stock restoration after a cancel or aborted checkout
async fn restore_stock(db: &Surreal<Db>, items: &[OrderItem], order_id: &str) {
    if let Err((_, e)) =
        apply_stock(db, items, order_id, 1, StockChangeType::OrderCancelled).await
    {
        warn!(target: "checkout", order = %order_id, error = %e, "Stock restoration failed");
    }
}
