//! Public shop handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{Product, Review, Shop};
use crate::db::repository::{ProductRepository, ReviewRepository, ShopRepository};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ShopSearchParams {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/shops - browse active, approved shops
pub async fn search(
    State(state): State<ServerState>,
    Query(params): Query<ShopSearchParams>,
) -> AppResult<Json<Vec<Shop>>> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let start = (params.page.unwrap_or(1).max(1) - 1) * limit;

    let shops = ShopRepository::new(state.db.clone())
        .search(params.search, limit, start)
        .await?;
    Ok(Json(shops))
}

/// GET /api/shops/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Shop>> {
    let shop = ShopRepository::new(state.db.clone())
        .find_by_id(&id)
        .await?
        .filter(|s| s.is_active && s.approved)
        .ok_or_else(|| AppError::not_found(format!("Shop {id}")))?;
    Ok(Json(shop))
}

/// GET /api/shops/:id/products - a shop's available products
pub async fn list_products(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Product>>> {
    ShopRepository::new(state.db.clone())
        .find_by_id(&id)
        .await?
        .filter(|s| s.is_active && s.approved)
        .ok_or_else(|| AppError::not_found(format!("Shop {id}")))?;

    let products = ProductRepository::new(state.db.clone())
        .list_by_shop(&id)
        .await?
        .into_iter()
        .filter(|p| p.is_available)
        .collect();
    Ok(Json(products))
}

/// GET /api/shops/:id/reviews
pub async fn list_reviews(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = ReviewRepository::new(state.db.clone())
        .list_for_shop(&id)
        .await?;
    Ok(Json(reviews))
}
