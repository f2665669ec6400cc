//! Delivery assignment and rider progression

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{info, warn};

use crate::db::models::{
    ApprovalStatus, Delivery, DeliveryStatus, NotificationType, OrderStatus, Role,
};
use crate::db::repository::{
    DeliveryRepository, OrderRepository, UserRoleRepository, parse_record_id,
};
use crate::services::notifier;
use crate::utils::{AppError, AppResult};

/// Assign a rider to a pending delivery (admin action).
///
/// Re-assigning the same rider is a no-op; handing an assigned delivery
/// to a different rider is rejected.
pub async fn assign_rider(
    db: &Surreal<Db>,
    delivery_id: &str,
    rider_id: &str,
) -> AppResult<Delivery> {
    let rider_rid = parse_record_id("user", rider_id)?;

    let roles = UserRoleRepository::new(db.clone());
    match roles.find_active(rider_id, Role::Rider).await? {
        Some(row) if row.status == ApprovalStatus::Approved => {}
        Some(_) => return Err(AppError::validation("Rider is not approved")),
        None => return Err(AppError::validation("User is not a rider")),
    }

    let deliveries = DeliveryRepository::new(db.clone());
    let delivery = deliveries
        .find_by_id(delivery_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Delivery {delivery_id}")))?;

    if let Some(current) = &delivery.rider {
        if current == &rider_rid {
            return Ok(delivery);
        }
        return Err(AppError::conflict(
            "Delivery is already assigned to another rider",
        ));
    }

    let assigned = deliveries
        .assign(delivery_id, rider_id)
        .await?
        .ok_or_else(|| AppError::conflict("Delivery was assigned concurrently"))?;

    notifier::notify(
        db,
        &rider_rid,
        NotificationType::DeliveryAssigned,
        "New delivery",
        format!("Delivery {delivery_id} has been assigned to you"),
        Some(format!("/rider/deliveries/{delivery_id}")),
    )
    .await;

    info!(target: "delivery", delivery = %delivery_id, rider = %rider_id, "Rider assigned");
    Ok(assigned)
}

/// Advance a delivery one step along the rider progression. Completing a
/// delivery also moves its order to DELIVERED and notifies the buyer.
pub async fn rider_update_status(
    db: &Surreal<Db>,
    rider_id: &str,
    delivery_id: &str,
    target: DeliveryStatus,
) -> AppResult<Delivery> {
    let rider_rid = parse_record_id("user", rider_id)?;

    let deliveries = DeliveryRepository::new(db.clone());
    let delivery = deliveries
        .find_by_id(delivery_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Delivery {delivery_id}")))?;

    if delivery.rider.as_ref() != Some(&rider_rid) {
        return Err(AppError::forbidden("Delivery is not assigned to you"));
    }
    if !delivery.status.rider_can_advance_to(target) {
        return Err(AppError::validation(format!(
            "Cannot move a {} delivery to {}",
            delivery.status.as_str(),
            target.as_str()
        )));
    }

    let updated = deliveries
        .transition(delivery_id, delivery.status, target)
        .await?
        .ok_or_else(|| AppError::conflict("Delivery changed concurrently, retry"))?;

    if target == DeliveryStatus::Delivered {
        complete_order(db, &updated).await?;
    }

    info!(
        target: "delivery",
        delivery = %delivery_id,
        status = %target.as_str(),
        "Delivery status updated"
    );
    Ok(updated)
}

/// Close out the order behind a completed delivery
async fn complete_order(db: &Surreal<Db>, delivery: &Delivery) -> AppResult<()> {
    let order_id = delivery.order.to_string();
    let orders = OrderRepository::new(db.clone());

    let order = orders
        .transition(&order_id, OrderStatus::OutForDelivery, OrderStatus::Delivered)
        .await?;
    let Some(order) = order else {
        // seller never marked OUT_FOR_DELIVERY; the delivery confirmation
        // still wins
        warn!(target: "delivery", order = %order_id, "Order was not OUT_FOR_DELIVERY at handoff");
        let from_paid = orders
            .transition(&order_id, OrderStatus::Paid, OrderStatus::Delivered)
            .await?;
        let from_preparing = match from_paid {
            Some(o) => Some(o),
            None => {
                orders
                    .transition(&order_id, OrderStatus::Preparing, OrderStatus::Delivered)
                    .await?
            }
        };
        if let Some(order) = from_preparing {
            notify_delivered(db, &order.buyer, &order_id).await;
        }
        return Ok(());
    };

    notify_delivered(db, &order.buyer, &order_id).await;
    Ok(())
}

async fn notify_delivered(db: &Surreal<Db>, buyer: &surrealdb::RecordId, order_id: &str) {
    notifier::notify(
        db,
        buyer,
        NotificationType::DeliveryCompleted,
        "Order delivered",
        format!("Your order {order_id} has been delivered"),
        Some(format!("/orders/{order_id}")),
    )
    .await;
}
