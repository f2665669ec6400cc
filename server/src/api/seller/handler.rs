//! Seller handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use surrealdb::RecordId;

use crate::auth::{CurrentUser, gate};
use crate::core::ServerState;
use crate::db::models::{
    BulkOrderStatusUpdate, BulkUpdateResult, Order, OrderStatus, OrderStatusUpdate, PricingUnit,
    PricingUnitInput, Product, ProductCreate, ProductUpdate, RestockPayload, Role, Shop,
    ShopUpdate, StockChange, StockSetPayload,
};
use crate::db::repository::{OrderRepository, ProductRepository, ShopRepository, StockRepository};
use crate::services::{catalog_csv, inventory, order_flow};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// Gate the caller as an approved seller and resolve their shop
async fn own_shop(state: &ServerState, current: &CurrentUser) -> AppResult<Shop> {
    gate::require_approved(&state.db, current, Role::Seller).await?;

    ShopRepository::new(state.db.clone())
        .find_by_owner(&current.id)
        .await?
        .ok_or_else(|| AppError::not_found("Seller has no shop"))
}

fn shop_rid(shop: &Shop) -> AppResult<&RecordId> {
    shop.id
        .as_ref()
        .ok_or_else(|| AppError::internal("Shop record has no id"))
}

/// Fetch a product and verify it belongs to the seller's shop
async fn own_product(state: &ServerState, shop: &Shop, product_id: &str) -> AppResult<Product> {
    let product = ProductRepository::new(state.db.clone())
        .find_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {product_id}")))?;
    if &product.shop != shop_rid(shop)? {
        return Err(AppError::forbidden("Product belongs to another shop"));
    }
    Ok(product)
}

/// Fetch a pricing unit and verify its product belongs to the seller's shop
async fn own_unit(state: &ServerState, shop: &Shop, unit_id: &str) -> AppResult<PricingUnit> {
    let unit = ProductRepository::new(state.db.clone())
        .find_unit(unit_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Pricing unit {unit_id}")))?;
    own_product(state, shop, &unit.product.to_string()).await?;
    Ok(unit)
}

fn validate_image_urls(images: Option<&[String]>) -> AppResult<()> {
    for url in images.into_iter().flatten() {
        if url.len() > MAX_URL_LEN {
            return Err(AppError::validation(format!(
                "Image URL is too long ({} chars, max {MAX_URL_LEN})",
                url.len()
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Shop
// =============================================================================

/// GET /api/seller/shop
pub async fn get_shop(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Shop>> {
    let shop = own_shop(&state, &current).await?;
    Ok(Json(shop))
}

/// PUT /api/seller/shop
pub async fn update_shop(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<ShopUpdate>,
) -> AppResult<Json<Shop>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    let shop = own_shop(&state, &current).await?;
    let shop_id = shop_rid(&shop)?.to_string();

    let updated = ShopRepository::new(state.db.clone())
        .update(&shop_id, payload)
        .await?;
    Ok(Json(updated))
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, serde::Serialize)]
pub struct SellerProduct {
    #[serde(flatten)]
    pub product: Product,
    pub pricing_units: Vec<PricingUnit>,
}

/// GET /api/seller/products - full catalog including hidden products
pub async fn list_products(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<SellerProduct>>> {
    let shop = own_shop(&state, &current).await?;
    let shop_id = shop_rid(&shop)?.to_string();

    let products = ProductRepository::new(state.db.clone());
    let mut out = Vec::new();
    for product in products.list_by_shop(&shop_id).await? {
        let Some(id) = &product.id else { continue };
        let pricing_units = products.find_units(&id.to_string()).await?;
        out.push(SellerProduct {
            product,
            pricing_units,
        });
    }
    Ok(Json(out))
}

/// POST /api/seller/products
pub async fn create_product(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_image_urls(payload.images.as_deref())?;
    for unit in &payload.pricing_units {
        validate_required_text(&unit.unit, "unit", MAX_SHORT_TEXT_LEN)?;
    }
    let shop = own_shop(&state, &current).await?;
    let shop_id = shop_rid(&shop)?.to_string();

    let created = ProductRepository::new(state.db.clone())
        .create(&shop_id, payload)
        .await?;
    Ok(Json(created))
}

/// PUT /api/seller/products/:id
pub async fn update_product(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_image_urls(payload.images.as_deref())?;
    let shop = own_shop(&state, &current).await?;
    own_product(&state, &shop, &id).await?;

    let updated = ProductRepository::new(state.db.clone())
        .update(&id, payload)
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/seller/products/:id - removes the product and its units
pub async fn delete_product(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let shop = own_shop(&state, &current).await?;
    own_product(&state, &shop, &id).await?;

    ProductRepository::new(state.db.clone()).delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

// =============================================================================
// Pricing units
// =============================================================================

/// POST /api/seller/products/:id/units
pub async fn create_unit(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<PricingUnitInput>,
) -> AppResult<Json<PricingUnit>> {
    validate_required_text(&payload.unit, "unit", MAX_SHORT_TEXT_LEN)?;
    let shop = own_shop(&state, &current).await?;
    let product = own_product(&state, &shop, &id).await?;
    let product_id = product
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Product record has no id"))?;

    let created = ProductRepository::new(state.db.clone())
        .create_unit(product_id, payload)
        .await?;
    Ok(Json(created))
}

#[derive(Debug, Deserialize)]
pub struct PricingUnitUpdate {
    pub price: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub is_active: Option<bool>,
}

/// PUT /api/seller/units/:id - stock changes go through the inventory
/// routes instead, so they always hit the ledger
pub async fn update_unit(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<PricingUnitUpdate>,
) -> AppResult<Json<PricingUnit>> {
    let shop = own_shop(&state, &current).await?;
    own_unit(&state, &shop, &id).await?;

    let updated = ProductRepository::new(state.db.clone())
        .update_unit(
            &id,
            payload.price,
            payload.low_stock_threshold,
            payload.is_active,
        )
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/seller/units/:id
pub async fn delete_unit(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let shop = own_shop(&state, &current).await?;
    own_unit(&state, &shop, &id).await?;

    ProductRepository::new(state.db.clone())
        .delete_unit(&id)
        .await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub status: Option<OrderStatus>,
}

/// GET /api/seller/orders?status=
pub async fn list_orders(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(params): Query<OrderListParams>,
) -> AppResult<Json<Vec<Order>>> {
    let shop = own_shop(&state, &current).await?;
    let shop_id = shop_rid(&shop)?.to_string();

    let orders = OrderRepository::new(state.db.clone())
        .list_for_shop(&shop_id, params.status)
        .await?;
    Ok(Json(orders))
}

/// PUT /api/seller/orders/:id/status
pub async fn update_order_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    let shop = own_shop(&state, &current).await?;

    let updated =
        order_flow::seller_update_status(&state.db, shop_rid(&shop)?, &id, payload.status).await?;
    Ok(Json(updated))
}

/// PUT /api/seller/orders/bulk-status
pub async fn bulk_update_orders(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<BulkOrderStatusUpdate>,
) -> AppResult<Json<BulkUpdateResult>> {
    if payload.order_ids.is_empty() {
        return Err(AppError::validation("order_ids cannot be empty"));
    }
    let shop = own_shop(&state, &current).await?;

    let result = order_flow::seller_bulk_update(
        &state.db,
        shop_rid(&shop)?,
        &payload.order_ids,
        payload.status,
    )
    .await?;
    Ok(Json(result))
}

// =============================================================================
// Inventory
// =============================================================================

/// GET /api/seller/inventory/low-stock
pub async fn low_stock(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<PricingUnit>>> {
    let shop = own_shop(&state, &current).await?;
    let shop_id = shop_rid(&shop)?.to_string();

    let units = StockRepository::new(state.db.clone())
        .low_stock(&shop_id)
        .await?;
    Ok(Json(units))
}

/// PUT /api/seller/inventory/units/:id/stock - absolute stock set
pub async fn set_stock(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<StockSetPayload>,
) -> AppResult<Json<PricingUnit>> {
    let shop = own_shop(&state, &current).await?;
    own_unit(&state, &shop, &id).await?;

    let unit = inventory::set_stock(&state.db, &id, payload.stock, payload.reason).await?;
    Ok(Json(unit))
}

/// POST /api/seller/inventory/units/:id/restock
pub async fn restock(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<RestockPayload>,
) -> AppResult<Json<PricingUnit>> {
    let shop = own_shop(&state, &current).await?;
    own_unit(&state, &shop, &id).await?;

    let unit = inventory::restock(&state.db, &id, payload.quantity, payload.reason).await?;
    Ok(Json(unit))
}

/// GET /api/seller/inventory/units/:id/history - ledger, newest first
pub async fn stock_history(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<StockChange>>> {
    let shop = own_shop(&state, &current).await?;
    own_unit(&state, &shop, &id).await?;

    let history = StockRepository::new(state.db.clone()).history(&id).await?;
    Ok(Json(history))
}

// =============================================================================
// CSV catalog
// =============================================================================

/// GET /api/seller/catalog/export
pub async fn export_catalog(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let shop = own_shop(&state, &current).await?;
    let shop_id = shop_rid(&shop)?.to_string();

    let csv = catalog_csv::export(&state.db, &shop_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"catalog.csv\"",
            ),
        ],
        csv,
    ))
}

/// POST /api/seller/catalog/import - CSV in the request body
pub async fn import_catalog(
    State(state): State<ServerState>,
    current: CurrentUser,
    body: Bytes,
) -> AppResult<Json<catalog_csv::ImportResult>> {
    let shop = own_shop(&state, &current).await?;
    let shop_id = shop_rid(&shop)?.to_string();

    let result = catalog_csv::import(&state.db, &shop_id, &body).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_length_is_capped() {
        let long = vec!["x".repeat(MAX_URL_LEN + 1)];
        assert!(validate_image_urls(Some(&long)).is_err());

        let fine = vec!["https://cdn.sokoni.test/maize.jpg".to_string()];
        assert!(validate_image_urls(Some(&fine)).is_ok());
        assert!(validate_image_urls(None).is_ok());
    }
}
