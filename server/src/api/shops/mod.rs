//! Public shop API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/shops", shop_routes())
}

fn shop_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::search))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/products", get(handler::list_products))
        .route("/{id}/reviews", get(handler::list_reviews))
}
