//! Auth API module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", auth_routes())
}

fn auth_routes() -> Router<ServerState> {
    Router::new()
        // Public
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
        .route("/forgot-password", post(handler::forgot_password))
        .route("/reset-password", post(handler::reset_password))
        .route("/verify-email", post(handler::send_email_verification))
        .route("/verify-email/confirm", post(handler::confirm_email))
        // Authenticated
        .route(
            "/profile",
            get(handler::profile).put(handler::update_profile),
        )
        .route("/otp/send", post(handler::send_otp))
        .route("/otp/verify", post(handler::verify_otp))
        .route("/apply/seller", post(handler::apply_seller))
        .route("/apply/rider", post(handler::apply_rider))
        .route("/roles", get(handler::list_roles))
        .route("/password", put(handler::change_password))
}
