//! Admin API module
//!
//! Platform stats, role application review, delivery assignment and
//! escrow arbitration. Every route requires an active ADMIN role.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", admin_routes())
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/stats", get(handler::stats))
        // Role applications
        .route("/applications", get(handler::list_applications))
        .route("/applications/{id}/approve", post(handler::approve_application))
        .route("/applications/{id}/reject", post(handler::reject_application))
        .route("/applications/{id}/kyc", post(handler::set_kyc))
        // Delivery board
        .route("/deliveries", get(handler::list_deliveries))
        .route("/deliveries/{id}/assign", post(handler::assign_rider))
        // Escrow arbitration
        .route("/orders/{id}/release", post(handler::release_escrow))
        .route("/orders/{id}/refund", post(handler::refund_order))
        .route("/orders/{id}/reject-dispute", post(handler::reject_dispute))
}
