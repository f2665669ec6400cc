//! Seller API module
//!
//! Shop management, product and pricing-unit CRUD, order fulfilment,
//! inventory and the CSV catalog surface. Every route requires an
//! active, APPROVED SELLER role and operates on the caller's own shop.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/seller", seller_routes())
}

fn seller_routes() -> Router<ServerState> {
    Router::new()
        // Shop
        .route("/shop", get(handler::get_shop).put(handler::update_shop))
        // Products and pricing units
        .route(
            "/products",
            get(handler::list_products).post(handler::create_product),
        )
        .route(
            "/products/{id}",
            put(handler::update_product).delete(handler::delete_product),
        )
        .route("/products/{id}/units", post(handler::create_unit))
        .route(
            "/units/{id}",
            put(handler::update_unit).delete(handler::delete_unit),
        )
        // Orders
        .route("/orders", get(handler::list_orders))
        .route("/orders/bulk-status", put(handler::bulk_update_orders))
        .route("/orders/{id}/status", put(handler::update_order_status))
        // Inventory
        .route("/inventory/low-stock", get(handler::low_stock))
        .route("/inventory/units/{id}/stock", put(handler::set_stock))
        .route("/inventory/units/{id}/restock", post(handler::restock))
        .route("/inventory/units/{id}/history", get(handler::stock_history))
        // CSV catalog
        .route("/catalog/export", get(handler::export_catalog))
        .route("/catalog/import", post(handler::import_catalog))
}
