//! Wishlist handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{WishlistAdd, WishlistItem};
use crate::db::repository::{ProductRepository, WishlistRepository};
use crate::utils::{AppError, AppResponse, AppResult, ok_with_message};

/// GET /api/wishlist
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<WishlistItem>>> {
    let items = WishlistRepository::new(state.db.clone())
        .list_for_user(&current.id)
        .await?;
    Ok(Json(items))
}

/// POST /api/wishlist
pub async fn add(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<WishlistAdd>,
) -> AppResult<Json<WishlistItem>> {
    ProductRepository::new(state.db.clone())
        .find_by_id(&payload.product)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", payload.product)))?;

    let item = WishlistRepository::new(state.db.clone())
        .add(&current.id, &payload.product)
        .await?;
    Ok(Json(item))
}

/// DELETE /api/wishlist/:product_id
pub async fn remove(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    let removed = WishlistRepository::new(state.db.clone())
        .remove(&current.id, &product_id)
        .await?;
    if !removed {
        return Err(AppError::not_found("Product is not on your wishlist"));
    }
    Ok(ok_with_message((), "Removed from wishlist"))
}
