//! Buyer order handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{CheckoutPayload, Delivery, Order, Payment};
use crate::db::repository::{
    DeliveryRepository, OrderRepository, PaymentRepository, parse_record_id,
};
use crate::services::checkout;
use crate::services::checkout::CheckoutResult;
use crate::utils::{AppError, AppResult};

/// POST /api/orders - checkout
pub async fn checkout(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CheckoutPayload>,
) -> AppResult<Json<CheckoutResult>> {
    let result = checkout::checkout(
        &state.db,
        &current.id,
        payload,
        state.config.platform_fee_bps,
        state.config.default_delivery_fee,
    )
    .await?;
    Ok(Json(result))
}

/// GET /api/orders - the caller's orders
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.db.clone())
        .list_for_buyer(&current.id)
        .await?;
    Ok(Json(orders))
}

#[derive(Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub payment: Option<Payment>,
    pub delivery: Option<Delivery>,
}

/// GET /api/orders/:id - order with payment and delivery state
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let order = OrderRepository::new(state.db.clone())
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;
    if order.buyer != parse_record_id("user", &current.id)? {
        return Err(AppError::forbidden("Not your order"));
    }

    let payment = PaymentRepository::new(state.db.clone())
        .find_by_order(&id)
        .await?;
    let delivery = DeliveryRepository::new(state.db.clone())
        .find_by_order(&id)
        .await?;

    Ok(Json(OrderDetail {
        order,
        payment,
        delivery,
    }))
}

/// POST /api/orders/:id/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = checkout::cancel(&state.db, &current.id, &id).await?;
    Ok(Json(order))
}

/// POST /api/orders/:id/dispute
pub async fn dispute(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = checkout::dispute(&state.db, &current.id, &id).await?;
    Ok(Json(order))
}
