//! Rider assignment and delivery progression

mod common;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use sokoni_server::db::models::{ApprovalStatus, DeliveryStatus, OrderStatus};
use sokoni_server::db::repository::{
    DeliveryRepository, OrderRepository, RiderRatingRepository, parse_record_id,
};
use sokoni_server::services::delivery;
use sokoni_server::services::gateway::{WebhookData, WebhookEvent, process_event};

/// Checkout and settle the payment, returning (order_id, delivery_id)
async fn paid_order(db: &Surreal<Db>) -> (String, String) {
    let (_seller, shop_id) = common::create_seller_with_shop(db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(db, &shop_id, Some(10)).await;
    let buyer_id = common::create_user(db, "Buyer", "buyer@sokoni.test").await;

    let result = common::place_order(db, &buyer_id, &shop_id, &unit_id, 1).await;
    let order_id = result.order.id.unwrap().to_string();

    process_event(
        db,
        WebhookEvent {
            event: "charge.success".to_string(),
            data: WebhookData {
                reference: result.payment.reference.clone(),
            },
        },
    )
    .await
    .unwrap();

    let delivery_id = DeliveryRepository::new(db.clone())
        .find_by_order(&order_id)
        .await
        .unwrap()
        .unwrap()
        .id
        .unwrap()
        .to_string();
    (order_id, delivery_id)
}

#[tokio::test]
async fn assignment_requires_an_approved_rider() {
    let db = common::mem_db().await;
    let (_order, delivery_id) = paid_order(&db).await;

    let pending = common::create_rider(&db, "pending@sokoni.test", ApprovalStatus::Pending).await;
    assert!(delivery::assign_rider(&db, &delivery_id, &pending).await.is_err());

    let not_a_rider = common::create_user(&db, "Plain", "plain@sokoni.test").await;
    assert!(delivery::assign_rider(&db, &delivery_id, &not_a_rider).await.is_err());

    let approved = common::create_rider(&db, "rider@sokoni.test", ApprovalStatus::Approved).await;
    let assigned = delivery::assign_rider(&db, &delivery_id, &approved).await.unwrap();
    assert_eq!(assigned.status, DeliveryStatus::Assigned);
    assert!(assigned.assigned_at.is_some());
}

#[tokio::test]
async fn reassignment_is_noop_for_same_rider_and_conflict_for_another() {
    let db = common::mem_db().await;
    let (_order, delivery_id) = paid_order(&db).await;

    let first = common::create_rider(&db, "first@sokoni.test", ApprovalStatus::Approved).await;
    let second = common::create_rider(&db, "second@sokoni.test", ApprovalStatus::Approved).await;

    delivery::assign_rider(&db, &delivery_id, &first).await.unwrap();

    let repeat = delivery::assign_rider(&db, &delivery_id, &first).await.unwrap();
    assert_eq!(repeat.status, DeliveryStatus::Assigned);

    assert!(delivery::assign_rider(&db, &delivery_id, &second).await.is_err());
}

#[tokio::test]
async fn rider_progression_is_linear_and_owner_only() {
    let db = common::mem_db().await;
    let (_order, delivery_id) = paid_order(&db).await;
    let rider = common::create_rider(&db, "rider@sokoni.test", ApprovalStatus::Approved).await;
    let other = common::create_rider(&db, "other@sokoni.test", ApprovalStatus::Approved).await;

    delivery::assign_rider(&db, &delivery_id, &rider).await.unwrap();

    // only the assigned rider may advance
    assert!(
        delivery::rider_update_status(&db, &other, &delivery_id, DeliveryStatus::PickedUp)
            .await
            .is_err()
    );

    // no skipping straight to IN_TRANSIT
    assert!(
        delivery::rider_update_status(&db, &rider, &delivery_id, DeliveryStatus::InTransit)
            .await
            .is_err()
    );

    let picked = delivery::rider_update_status(&db, &rider, &delivery_id, DeliveryStatus::PickedUp)
        .await
        .unwrap();
    assert_eq!(picked.status, DeliveryStatus::PickedUp);

    // no going backwards
    assert!(
        delivery::rider_update_status(&db, &rider, &delivery_id, DeliveryStatus::Assigned)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn failed_delivery_is_terminal() {
    let db = common::mem_db().await;
    let (_order, delivery_id) = paid_order(&db).await;
    let rider = common::create_rider(&db, "rider@sokoni.test", ApprovalStatus::Approved).await;

    delivery::assign_rider(&db, &delivery_id, &rider).await.unwrap();
    let failed = delivery::rider_update_status(&db, &rider, &delivery_id, DeliveryStatus::Failed)
        .await
        .unwrap();
    assert_eq!(failed.status, DeliveryStatus::Failed);

    assert!(
        delivery::rider_update_status(&db, &rider, &delivery_id, DeliveryStatus::PickedUp)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn completing_a_delivery_closes_the_order() {
    let db = common::mem_db().await;
    let (order_id, delivery_id) = paid_order(&db).await;
    let rider = common::create_rider(&db, "rider@sokoni.test", ApprovalStatus::Approved).await;

    delivery::assign_rider(&db, &delivery_id, &rider).await.unwrap();
    for status in [
        DeliveryStatus::PickedUp,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
    ] {
        delivery::rider_update_status(&db, &rider, &delivery_id, status)
            .await
            .unwrap();
    }

    let final_delivery = DeliveryRepository::new(db.clone())
        .find_by_id(&delivery_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(final_delivery.status, DeliveryStatus::Delivered);
    assert!(final_delivery.delivered_at.is_some());

    // order auto-advanced even though the seller never set OUT_FOR_DELIVERY
    let order = OrderRepository::new(db.clone())
        .find_by_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn a_delivery_takes_exactly_one_rider_rating() {
    let db = common::mem_db().await;
    let (order_id, delivery_id) = paid_order(&db).await;
    let rider = common::create_rider(&db, "rider@sokoni.test", ApprovalStatus::Approved).await;

    delivery::assign_rider(&db, &delivery_id, &rider).await.unwrap();
    for status in [
        DeliveryStatus::PickedUp,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
    ] {
        delivery::rider_update_status(&db, &rider, &delivery_id, status)
            .await
            .unwrap();
    }

    let order = OrderRepository::new(db.clone())
        .find_by_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    let ratings = RiderRatingRepository::new(db.clone());
    let delivery_rid = parse_record_id("delivery", &delivery_id).unwrap();
    let rider_rid = parse_record_id("user", &rider).unwrap();

    ratings
        .create(&delivery_rid, &rider_rid, &order.buyer, 4, None)
        .await
        .unwrap();
    let duplicate = ratings
        .create(&delivery_rid, &rider_rid, &order.buyer, 1, None)
        .await;
    assert!(duplicate.is_err());

    // the first rating stands alone
    assert_eq!(ratings.mean_for_rider(&rider).await.unwrap(), Some(4.0));
}
