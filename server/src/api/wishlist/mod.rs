//! Wishlist API module

mod handler;

use axum::{
    Router,
    routing::{delete, get},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/wishlist",
            get(handler::list).post(handler::add),
        )
        .route("/api/wishlist/{product_id}", delete(handler::remove))
}
