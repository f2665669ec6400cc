//! Delivery fee quote handler

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::ShopRepository;
use crate::services::delivery_fee::{self, FeeQuote};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub shop: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// GET /api/delivery-fee?shop=...&latitude=...&longitude=...
pub async fn quote(
    State(state): State<ServerState>,
    Query(params): Query<QuoteParams>,
) -> AppResult<Json<FeeQuote>> {
    let shop = ShopRepository::new(state.db.clone())
        .find_by_id(&params.shop)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Shop {}", params.shop)))?;

    Ok(Json(delivery_fee::quote(
        (shop.latitude, shop.longitude),
        (params.latitude, params.longitude),
        state.config.default_delivery_fee,
    )))
}
