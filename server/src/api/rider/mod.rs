//! Rider API module

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/rider", rider_routes())
}

fn rider_routes() -> Router<ServerState> {
    Router::new()
        .route("/deliveries", get(handler::list_deliveries))
        .route("/deliveries/{id}/status", put(handler::update_status))
}
