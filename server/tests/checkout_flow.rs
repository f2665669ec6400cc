//! Checkout, stock ledger and buyer cancellation flows

mod common;

use sokoni_server::db::models::{
    CheckoutItem, CheckoutPayload, EscrowStatus, OrderStatus, PaymentStatus,
};
use sokoni_server::db::repository::{
    PaymentRepository, ProductRepository, StockRepository,
};
use sokoni_server::services::checkout;

use common::{DEFAULT_DELIVERY_FEE, PLATFORM_FEE_BPS};

#[tokio::test]
async fn checkout_decrements_stock_and_opens_pending_payment() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(10)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let result = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 3).await;

    assert_eq!(result.order.status, OrderStatus::Pending);
    assert_eq!(result.order.total, 3 * 1450);
    assert_eq!(result.order.platform_fee, 3 * 1450 * PLATFORM_FEE_BPS / 10_000);
    assert_eq!(result.payment.status, PaymentStatus::Pending);
    assert_eq!(result.payment.escrow_status, EscrowStatus::Held);
    assert_eq!(
        result.payment.amount,
        result.order.total + result.order.delivery_fee
    );

    let unit = ProductRepository::new(db.clone())
        .find_unit(&unit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unit.stock, Some(7));

    // the decrement is in the ledger, tied to the order
    let history = StockRepository::new(db.clone())
        .history(&unit_id)
        .await
        .unwrap();
    assert_eq!(history[0].delta, -3);
    assert_eq!(history[0].stock_after, Some(7));
    assert!(history[0].order.is_some());
}

#[tokio::test]
async fn checkout_rejects_insufficient_stock_without_side_effects() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(2)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let err = checkout::checkout(
        &db,
        &buyer_id,
        CheckoutPayload {
            shop: shop_id.clone(),
            items: vec![CheckoutItem {
                pricing_unit: unit_id.clone(),
                quantity: 5,
            }],
            dest_latitude: None,
            dest_longitude: None,
        },
        PLATFORM_FEE_BPS,
        DEFAULT_DELIVERY_FEE,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Insufficient stock"));

    let unit = ProductRepository::new(db.clone())
        .find_unit(&unit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unit.stock, Some(2));
}

#[tokio::test]
async fn checkout_rejects_empty_cart_and_bad_quantities() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, None).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let empty = checkout::checkout(
        &db,
        &buyer_id,
        CheckoutPayload {
            shop: shop_id.clone(),
            items: vec![],
            dest_latitude: None,
            dest_longitude: None,
        },
        PLATFORM_FEE_BPS,
        DEFAULT_DELIVERY_FEE,
    )
    .await;
    assert!(empty.is_err());

    let zero_quantity = checkout::checkout(
        &db,
        &buyer_id,
        CheckoutPayload {
            shop: shop_id,
            items: vec![CheckoutItem {
                pricing_unit: unit_id,
                quantity: 0,
            }],
            dest_latitude: None,
            dest_longitude: None,
        },
        PLATFORM_FEE_BPS,
        DEFAULT_DELIVERY_FEE,
    )
    .await;
    assert!(zero_quantity.is_err());
}

#[tokio::test]
async fn untracked_units_checkout_without_a_stock_cap() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, None).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let result = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 100).await;
    assert_eq!(result.order.status, OrderStatus::Pending);

    // ledger-only row, no cached count
    let history = StockRepository::new(db.clone())
        .history(&unit_id)
        .await
        .unwrap();
    assert_eq!(history[0].delta, -100);
    assert_eq!(history[0].stock_after, None);
}

#[tokio::test]
async fn buyer_cancel_restores_stock_and_voids_payment() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(10)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let result = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 4).await;
    let order_id = result.order.id.unwrap().to_string();

    let cancelled = checkout::cancel(&db, &buyer_id, &order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let unit = ProductRepository::new(db.clone())
        .find_unit(&unit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unit.stock, Some(10));

    let payment = PaymentRepository::new(db.clone())
        .find_by_order(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);

    // cancelling twice fails cleanly
    assert!(checkout::cancel(&db, &buyer_id, &order_id).await.is_err());
}

#[tokio::test]
async fn cancel_is_owner_only_and_pending_only() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(10)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;
    let other_id = common::create_user(&db, "Other", "other@sokoni.test").await;

    let result = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 1).await;
    let order_id = result.order.id.unwrap().to_string();

    assert!(checkout::cancel(&db, &other_id, &order_id).await.is_err());

    // once paid, the cancel window is closed
    PaymentRepository::new(db.clone())
        .mark_completed(&result.payment.reference)
        .await
        .unwrap();
    sokoni_server::db::repository::OrderRepository::new(db.clone())
        .transition(&order_id, OrderStatus::Pending, OrderStatus::Paid)
        .await
        .unwrap()
        .unwrap();
    assert!(checkout::cancel(&db, &buyer_id, &order_id).await.is_err());
}
