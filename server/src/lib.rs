//! Sokoni Server - regional marketplace backend
//!
//! # Overview
//!
//! Single-binary HTTP API for a buyer/seller/rider marketplace:
//!
//! - **Auth** (`auth`): JWT + Argon2, email/OTP verification, role gate
//! - **Database** (`db`): embedded SurrealDB, repository per table
//! - **Services** (`services`): checkout, escrow, deliveries, CSV catalog
//! - **HTTP API** (`api`): RESTful routes per surface
//!
//! # Module structure
//!
//! ```text
//! server/src/
//! ├── core/          # config, state, server, errors
//! ├── auth/          # JWT, extractor, middleware, role gate
//! ├── db/            # models and repositories
//! ├── services/      # multi-entity flows
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # errors, logging, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - structured events on the "security" target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
   _____       __               _
  / ___/____  / /______  ____  (_)
  \__ \/ __ \/ //_/ __ \/ __ \/ /
 ___/ / /_/ / ,< / /_/ / / / / /
/____/\____/_/|_|\____/_/ /_/_/
    "#
    );
}

/// Prepare the process environment: dotenv and logging.
///
/// Runs before [`Config::from_env`] so `.env` values are visible to it.
pub fn setup_environment() -> core::Result<()> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}
