//! Escrow release and dispute refunds
//!
//! Money held by a completed payment moves exactly once, either to the
//! seller (release) or back to the buyer (refund). The final movement is
//! a conditional update; everything before it only produces the most
//! specific rejection for the caller.

use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::info;

use crate::db::models::{
    EscrowStatus, NotificationType, OrderStatus, Payment, PaymentStatus,
};
use crate::db::repository::{OrderRepository, PaymentRepository, ShopRepository};
use crate::services::notifier;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct ReleaseResult {
    pub payment: Payment,
    /// Seller payout: order total minus the platform fee, minor units
    pub payout: i64,
}

/// Release held funds to the seller (admin action, delivered orders only).
pub async fn release(db: &Surreal<Db>, order_id: &str) -> AppResult<ReleaseResult> {
    let orders = OrderRepository::new(db.clone());
    let order = orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

    let payments = PaymentRepository::new(db.clone());
    let payment = payments
        .find_by_order(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id} has no payment")))?;

    match payment.escrow_status {
        EscrowStatus::Held => {}
        EscrowStatus::Released => {
            return Err(AppError::conflict("Escrow already released"));
        }
        EscrowStatus::Refunded => {
            return Err(AppError::conflict("Escrow already refunded"));
        }
    }
    // Held escrow on anything but a completed payment is an inconsistent row
    if payment.status != PaymentStatus::Completed {
        return Err(AppError::validation(format!(
            "Payment is {}, not settled",
            payment.status.as_str()
        )));
    }
    if order.status != OrderStatus::Delivered {
        return Err(AppError::validation(format!(
            "Order is {}, funds release requires DELIVERED",
            order.status.as_str()
        )));
    }

    let payment_id = payment
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Payment record has no id"))?
        .to_string();
    let released = payments
        .release(&payment_id)
        .await?
        .ok_or_else(|| AppError::conflict("Escrow already released"))?;

    let payout = order.total - order.platform_fee;

    if let Ok(Some(shop)) = ShopRepository::new(db.clone())
        .find_by_id(&order.shop.to_string())
        .await
    {
        notifier::notify(
            db,
            &shop.owner,
            NotificationType::EscrowReleased,
            "Funds released",
            format!("Payout for order {order_id} has been released"),
            Some(format!("/seller/orders/{order_id}")),
        )
        .await;
    }

    info!(target: "escrow", order = %order_id, payout = payout, "Escrow released");
    Ok(ReleaseResult {
        payment: released,
        payout,
    })
}

/// Refund a disputed order's held funds to the buyer (admin verdict).
/// Closes the dispute by cancelling the order.
pub async fn refund(db: &Surreal<Db>, order_id: &str) -> AppResult<Payment> {
    let orders = OrderRepository::new(db.clone());
    let order = orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

    if order.status != OrderStatus::Disputed {
        return Err(AppError::validation(
            "Refunds only apply to disputed orders",
        ));
    }

    let payments = PaymentRepository::new(db.clone());
    let payment = payments
        .find_by_order(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id} has no payment")))?;
    match payment.escrow_status {
        EscrowStatus::Held => {}
        EscrowStatus::Released => {
            return Err(AppError::conflict("Escrow already released"));
        }
        EscrowStatus::Refunded => {
            return Err(AppError::conflict("Escrow already refunded"));
        }
    }

    let payment_id = payment
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Payment record has no id"))?
        .to_string();
    let refunded = payments
        .refund(&payment_id)
        .await?
        .ok_or_else(|| AppError::conflict("Escrow already moved"))?;

    orders
        .transition(order_id, OrderStatus::Disputed, OrderStatus::Cancelled)
        .await?;

    notifier::notify(
        db,
        &order.buyer,
        NotificationType::Dispute,
        "Dispute resolved",
        format!("Your dispute on order {order_id} was resolved with a refund"),
        Some(format!("/orders/{order_id}")),
    )
    .await;

    info!(target: "escrow", order = %order_id, "Escrow refunded");
    Ok(refunded)
}

/// Reject a dispute in the seller's favor: the order returns to
/// DELIVERED with funds still held, ready for a normal release.
pub async fn reject_dispute(db: &Surreal<Db>, order_id: &str) -> AppResult<()> {
    let orders = OrderRepository::new(db.clone());
    let order = orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

    if order.status != OrderStatus::Disputed {
        return Err(AppError::validation("Order is not disputed"));
    }

    orders
        .transition(order_id, OrderStatus::Disputed, OrderStatus::Delivered)
        .await?
        .ok_or_else(|| AppError::conflict("Order changed concurrently, retry"))?;

    notifier::notify(
        db,
        &order.buyer,
        NotificationType::Dispute,
        "Dispute resolved",
        format!("Your dispute on order {order_id} was reviewed and closed"),
        Some(format!("/orders/{order_id}")),
    )
    .await;

    info!(target: "escrow", order = %order_id, "Dispute rejected");
    Ok(())
}
