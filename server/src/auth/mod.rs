//! Authentication module
//!
//! JWT issuance/validation, the [`CurrentUser`] extractor, the auth
//! middleware and the database-backed role gate.

pub mod extractor;
pub mod gate;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, RoleGrant};
pub use middleware::require_auth;
