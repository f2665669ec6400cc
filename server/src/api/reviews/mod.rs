//! Review API module (shop reviews and rider ratings)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/reviews", post(handler::create_review))
        .route(
            "/api/rider-ratings",
            post(handler::create_rider_rating),
        )
        .route("/api/riders/{id}/rating", get(handler::rider_rating))
}
