//! Payment confirmation, escrow release and dispute arbitration

mod common;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use sokoni_server::db::models::{
    ApprovalStatus, DeliveryStatus, EscrowStatus, OrderStatus, PaymentStatus,
};
use sokoni_server::db::repository::{DeliveryRepository, OrderRepository, PaymentRepository};
use sokoni_server::services::gateway::{WebhookData, WebhookEvent, WebhookOutcome, process_event};
use sokoni_server::services::{checkout, delivery, escrow};

fn success_event(reference: &str) -> WebhookEvent {
    WebhookEvent {
        event: "charge.success".to_string(),
        data: WebhookData {
            reference: reference.to_string(),
        },
    }
}

/// Checkout, settle the payment and run the delivery to completion
async fn delivered_order(db: &Surreal<Db>) -> (String, String) {
    let (_seller, shop_id) = common::create_seller_with_shop(db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(db, &shop_id, Some(10)).await;
    let buyer_id = common::create_user(db, "Buyer", "buyer@sokoni.test").await;
    let rider_id = common::create_rider(db, "rider@sokoni.test", ApprovalStatus::Approved).await;

    let result = common::place_order(db, &buyer_id, &shop_id, &unit_id, 2).await;
    let order_id = result.order.id.unwrap().to_string();

    let outcome = process_event(db, success_event(&result.payment.reference))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Processed);

    let delivery_id = DeliveryRepository::new(db.clone())
        .find_by_order(&order_id)
        .await
        .unwrap()
        .expect("delivery created on payment")
        .id
        .unwrap()
        .to_string();

    delivery::assign_rider(db, &delivery_id, &rider_id).await.unwrap();
    for status in [
        DeliveryStatus::PickedUp,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
    ] {
        delivery::rider_update_status(db, &rider_id, &delivery_id, status)
            .await
            .unwrap();
    }

    (order_id, buyer_id)
}

#[tokio::test]
async fn payment_confirmation_is_idempotent() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(10)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let result = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 1).await;
    let order_id = result.order.id.unwrap().to_string();
    let reference = result.payment.reference.clone();

    let first = process_event(&db, success_event(&reference)).await.unwrap();
    assert_eq!(first, WebhookOutcome::Processed);

    let order = OrderRepository::new(db.clone())
        .find_by_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);

    // redelivery changes nothing
    let second = process_event(&db, success_event(&reference)).await.unwrap();
    assert_eq!(second, WebhookOutcome::AlreadyProcessed);

    let unknown = process_event(
        &db,
        WebhookEvent {
            event: "invoice.created".to_string(),
            data: WebhookData {
                reference: reference.clone(),
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(unknown, WebhookOutcome::Ignored);
}

#[tokio::test]
async fn failed_charge_marks_payment_failed() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(10)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let result = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 1).await;
    let reference = result.payment.reference.clone();

    let outcome = process_event(
        &db,
        WebhookEvent {
            event: "charge.failed".to_string(),
            data: WebhookData {
                reference: reference.clone(),
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome, WebhookOutcome::Processed);

    let payment = PaymentRepository::new(db.clone())
        .find_by_reference(&reference)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
}

#[tokio::test]
async fn release_requires_a_delivered_order() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(10)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let result = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 1).await;
    let order_id = result.order.id.unwrap().to_string();

    // payment not settled yet
    assert!(escrow::release(&db, &order_id).await.is_err());

    process_event(&db, success_event(&result.payment.reference))
        .await
        .unwrap();

    // settled but the order is only PAID
    let err = escrow::release(&db, &order_id).await.unwrap_err();
    assert!(err.to_string().contains("DELIVERED"));
}

#[tokio::test]
async fn release_pays_out_once() {
    let db = common::mem_db().await;
    let (order_id, _buyer) = delivered_order(&db).await;

    let result = escrow::release(&db, &order_id).await.unwrap();
    assert_eq!(result.payment.status, PaymentStatus::Released);
    assert_eq!(result.payment.escrow_status, EscrowStatus::Released);
    // 2 x 1450 at 10% platform fee
    assert_eq!(result.payout, 2900 - 290);

    let err = escrow::release(&db, &order_id).await.unwrap_err();
    assert!(err.to_string().contains("already released"));
}

#[tokio::test]
async fn release_refuses_a_payment_marked_released_with_escrow_still_held() {
    let db = common::mem_db().await;
    let (order_id, _buyer) = delivered_order(&db).await;

    // hand-corrupt the row: status moved without the escrow movement
    db.query("UPDATE payment SET status = 'RELEASED' WHERE escrow_status = 'HELD'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let err = escrow::release(&db, &order_id).await.unwrap_err();
    assert!(err.to_string().contains("not settled"));
}

#[tokio::test]
async fn dispute_refund_cancels_the_order() {
    let db = common::mem_db().await;
    let (order_id, buyer_id) = delivered_order(&db).await;

    // refund is a dispute verdict, not a general-purpose action
    assert!(escrow::refund(&db, &order_id).await.is_err());

    checkout::dispute(&db, &buyer_id, &order_id).await.unwrap();
    let refunded = escrow::refund(&db, &order_id).await.unwrap();
    assert_eq!(refunded.escrow_status, EscrowStatus::Refunded);

    let order = OrderRepository::new(db.clone())
        .find_by_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);

    // the money moved; no second refund, no release
    assert!(escrow::refund(&db, &order_id).await.is_err());
    assert!(escrow::release(&db, &order_id).await.is_err());
}

#[tokio::test]
async fn rejected_dispute_returns_to_delivered_and_releases_normally() {
    let db = common::mem_db().await;
    let (order_id, buyer_id) = delivered_order(&db).await;

    checkout::dispute(&db, &buyer_id, &order_id).await.unwrap();
    escrow::reject_dispute(&db, &order_id).await.unwrap();

    let order = OrderRepository::new(db.clone())
        .find_by_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);

    // funds stayed held, so the normal release path still works
    let result = escrow::release(&db, &order_id).await.unwrap();
    assert_eq!(result.payment.escrow_status, EscrowStatus::Released);
}
