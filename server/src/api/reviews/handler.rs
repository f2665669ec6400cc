//! Review handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    DeliveryStatus, OrderStatus, Review, ReviewCreate, RiderRating, RiderRatingCreate,
};
use crate::db::repository::{
    DeliveryRepository, OrderRepository, ReviewRepository, RiderRatingRepository,
    parse_record_id,
};
use crate::services::rating;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text, validate_rating};
use crate::utils::{AppError, AppResult};

/// POST /api/reviews - review a delivered order
pub async fn create_review(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<ReviewCreate>,
) -> AppResult<Json<Review>> {
    validate_rating(payload.rating)?;
    validate_optional_text(&payload.comment, "comment", MAX_NOTE_LEN)?;

    let order = OrderRepository::new(state.db.clone())
        .find_by_id(&payload.order)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {}", payload.order)))?;

    if order.buyer != parse_record_id("user", &current.id)? {
        return Err(AppError::forbidden("Not your order"));
    }
    if order.status != OrderStatus::Delivered {
        return Err(AppError::validation(
            "Only delivered orders can be reviewed",
        ));
    }
    let order_rid = order
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Order record has no id"))?;

    // Friendly rejection up front; the unique index still backs the race
    let reviews = ReviewRepository::new(state.db.clone());
    if reviews.find_by_order(&payload.order).await?.is_some() {
        return Err(AppError::conflict("Order already has a review"));
    }

    let review = reviews
        .create(
            order_rid,
            &order.shop,
            &order.buyer,
            payload.rating,
            payload.comment,
        )
        .await?;

    rating::recompute_shop_rating(&state.db, &order.shop.to_string()).await?;

    Ok(Json(review))
}

/// POST /api/rider-ratings - rate the rider of a completed delivery
pub async fn create_rider_rating(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<RiderRatingCreate>,
) -> AppResult<Json<RiderRating>> {
    validate_rating(payload.rating)?;
    validate_optional_text(&payload.comment, "comment", MAX_NOTE_LEN)?;

    let delivery = DeliveryRepository::new(state.db.clone())
        .find_by_id(&payload.delivery)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Delivery {}", payload.delivery)))?;

    if delivery.status != DeliveryStatus::Delivered {
        return Err(AppError::validation(
            "Only completed deliveries can be rated",
        ));
    }
    let rider = delivery
        .rider
        .as_ref()
        .ok_or_else(|| AppError::validation("Delivery has no rider"))?;

    let order = OrderRepository::new(state.db.clone())
        .find_by_id(&delivery.order.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("Order behind the delivery is gone"))?;
    if order.buyer != parse_record_id("user", &current.id)? {
        return Err(AppError::forbidden("Not your delivery"));
    }

    let delivery_rid = delivery
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Delivery record has no id"))?;
    let created = RiderRatingRepository::new(state.db.clone())
        .create(
            delivery_rid,
            rider,
            &order.buyer,
            payload.rating,
            payload.comment,
        )
        .await?;

    Ok(Json(created))
}

#[derive(Serialize)]
pub struct RiderRatingSummary {
    /// Mean rating, one decimal place; 0 when unrated
    pub rating: f64,
    pub count: usize,
}

/// GET /api/riders/:id/rating - rider mean rating, computed on read
pub async fn rider_rating(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<RiderRatingSummary>> {
    let repo = RiderRatingRepository::new(state.db.clone());
    let ratings = repo.list_for_rider(&id).await?;
    let mean = repo.mean_for_rider(&id).await?.unwrap_or(0.0);

    Ok(Json(RiderRatingSummary {
        rating: (mean * 10.0).round() / 10.0,
        count: ratings.len(),
    }))
}
