//! Rider handlers
//!
//! Every route requires an active, APPROVED RIDER role.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::{CurrentUser, gate};
use crate::core::ServerState;
use crate::db::models::{Delivery, DeliveryStatusUpdate, Role};
use crate::db::repository::DeliveryRepository;
use crate::services::delivery;
use crate::utils::AppResult;

/// GET /api/rider/deliveries - deliveries assigned to the caller
pub async fn list_deliveries(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<Delivery>>> {
    gate::require_approved(&state.db, &current, Role::Rider).await?;

    let deliveries = DeliveryRepository::new(state.db.clone())
        .list_for_rider(&current.id)
        .await?;
    Ok(Json(deliveries))
}

/// PUT /api/rider/deliveries/:id/status
pub async fn update_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<DeliveryStatusUpdate>,
) -> AppResult<Json<Delivery>> {
    gate::require_approved(&state.db, &current, Role::Rider).await?;

    let updated = delivery::rider_update_status(&state.db, &current.id, &id, payload.status).await?;
    Ok(Json(updated))
}
