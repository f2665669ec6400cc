//! Payment gateway webhook handling
//!
//! Events are authenticated with an HMAC-SHA512 signature over the raw
//! body, hex-encoded in the `x-gateway-signature` header. Verification is
//! constant-time. Processing is idempotent: a redelivered event finds the
//! payment already out of PENDING and changes nothing.

use ring::hmac;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{info, warn};

use crate::db::models::{NotificationType, OrderStatus};
use crate::db::repository::{
    DeliveryRepository, OrderRepository, PaymentRepository, ShopRepository,
};
use crate::services::notifier;
use crate::utils::{AppError, AppResult};

pub const SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Gateway event envelope
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub reference: String,
}

/// Verify the hex HMAC-SHA512 signature over the raw body
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA512, secret.as_bytes());
    hmac::verify(&key, body, &signature).is_ok()
}

/// Outcome of a processed event, reported back to the gateway
#[derive(Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    /// Known event, payment already settled (redelivery)
    AlreadyProcessed,
    /// Event type this service does not act on
    Ignored,
}

/// Apply a verified gateway event.
pub async fn process_event(db: &Surreal<Db>, event: WebhookEvent) -> AppResult<WebhookOutcome> {
    match event.event.as_str() {
        "charge.success" => confirm_payment(db, &event.data.reference).await,
        "charge.failed" => fail_payment(db, &event.data.reference).await,
        other => {
            info!(target: "gateway", event = %other, "Ignoring gateway event");
            Ok(WebhookOutcome::Ignored)
        }
    }
}

/// PENDING payment → COMPLETED (held in escrow), order → PAID, delivery
/// record created, both parties notified.
async fn confirm_payment(db: &Surreal<Db>, reference: &str) -> AppResult<WebhookOutcome> {
    let payments = PaymentRepository::new(db.clone());

    if payments.find_by_reference(reference).await?.is_none() {
        return Err(AppError::not_found(format!("Payment {reference}")));
    }

    let Some(payment) = payments.mark_completed(reference).await? else {
        info!(target: "gateway", reference = %reference, "Duplicate charge.success ignored");
        return Ok(WebhookOutcome::AlreadyProcessed);
    };

    let order_id = payment.order.to_string();
    let orders = OrderRepository::new(db.clone());
    let order = match orders
        .transition(&order_id, OrderStatus::Pending, OrderStatus::Paid)
        .await?
    {
        Some(order) => order,
        None => {
            // payment settled but the order already left PENDING
            // (e.g. buyer cancelled in the race window)
            warn!(
                target: "gateway",
                order = %order_id,
                "Payment completed for an order no longer PENDING"
            );
            return Ok(WebhookOutcome::Processed);
        }
    };

    DeliveryRepository::new(db.clone())
        .create(&payment.order)
        .await?;

    notifier::notify(
        db,
        &order.buyer,
        NotificationType::OrderStatus,
        "Payment received",
        format!("Your order {order_id} is paid and being processed"),
        Some(format!("/orders/{order_id}")),
    )
    .await;

    if let Ok(Some(shop)) = ShopRepository::new(db.clone())
        .find_by_id(&order.shop.to_string())
        .await
    {
        notifier::notify(
            db,
            &shop.owner,
            NotificationType::OrderStatus,
            "New paid order",
            format!("Order {order_id} is paid and awaiting preparation"),
            Some(format!("/seller/orders/{order_id}")),
        )
        .await;
    }

    info!(target: "gateway", reference = %reference, order = %order_id, "Payment confirmed");
    Ok(WebhookOutcome::Processed)
}

async fn fail_payment(db: &Surreal<Db>, reference: &str) -> AppResult<WebhookOutcome> {
    let payments = PaymentRepository::new(db.clone());
    payments
        .find_by_reference(reference)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Payment {reference}")))?;

    match payments.mark_failed(reference).await? {
        Some(_) => {
            info!(target: "gateway", reference = %reference, "Payment marked failed");
            Ok(WebhookOutcome::Processed)
        }
        None => Ok(WebhookOutcome::AlreadyProcessed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip() {
        let secret = "whsec_test";
        let body = br#"{"event":"charge.success","data":{"reference":"ref-1"}}"#;

        let key = hmac::Key::new(hmac::HMAC_SHA512, secret.as_bytes());
        let tag = hmac::sign(&key, body);
        let signature_hex = hex::encode(tag.as_ref());

        assert!(verify_signature(secret, body, &signature_hex));
        assert!(!verify_signature("wrong-secret", body, &signature_hex));
        assert!(!verify_signature(secret, b"tampered body", &signature_hex));
        assert!(!verify_signature(secret, body, "not-hex"));
    }
}
