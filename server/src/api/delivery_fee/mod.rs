//! Delivery fee quote API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/delivery-fee", get(handler::quote))
}
