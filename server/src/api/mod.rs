//! API route modules
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`auth`] - registration, login, profile, verification, role applications
//! - [`products`], [`shops`], [`delivery_fee`] - public catalog surface
//! - [`orders`] - buyer checkout and order lifecycle
//! - [`reviews`] - shop reviews and rider ratings
//! - [`wishlist`], [`notifications`] - buyer side channels
//! - [`seller`] - shop, catalog, inventory and order management
//! - [`rider`] - assigned deliveries and status updates
//! - [`admin`] - approvals, deliveries, escrow, disputes, stats
//! - [`payments`] - gateway webhook

pub mod admin;
pub mod auth;
pub mod delivery_fee;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod rider;
pub mod seller;
pub mod shops;
pub mod wishlist;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
