//! Service layer
//!
//! Multi-repository flows and domain policies. Handlers stay thin and
//! call into these; repositories stay single-table.

pub mod catalog_csv;
pub mod checkout;
pub mod delivery;
pub mod delivery_fee;
pub mod escrow;
pub mod gateway;
pub mod inventory;
pub mod mailer;
pub mod notifier;
pub mod order_flow;
pub mod rating;
