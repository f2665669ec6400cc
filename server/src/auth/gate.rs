//! Role gate
//!
//! Database-backed capability checks. A role grants capability only when
//! the role row is active and, for SELLER/RIDER, its status is APPROVED.
//! Tokens carry role grants too, but those reflect issuance time; every
//! role-gated mutation goes through this gate so that a revoked approval
//! takes effect immediately.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::CurrentUser;
use crate::db::models::{ApprovalStatus, Role};
use crate::db::repository::UserRoleRepository;
use crate::utils::{AppError, AppResult};

/// Require an active ADMIN role
pub async fn require_admin(db: &Surreal<Db>, user: &CurrentUser) -> AppResult<()> {
    let repo = UserRoleRepository::new(db.clone());
    let role = repo
        .find_active(&user.id, Role::Admin)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    match role {
        Some(_) => Ok(()),
        None => Err(AppError::forbidden("Admin access required")),
    }
}

/// Require an active, APPROVED role (SELLER or RIDER)
pub async fn require_approved(
    db: &Surreal<Db>,
    user: &CurrentUser,
    role: Role,
) -> AppResult<()> {
    let repo = UserRoleRepository::new(db.clone());
    let row = repo
        .find_active(&user.id, role)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    match row {
        Some(r) if r.status == ApprovalStatus::Approved => Ok(()),
        Some(_) => Err(AppError::forbidden(format!(
            "{} account is not approved",
            role.as_str()
        ))),
        None => Err(AppError::forbidden(format!(
            "{} role required",
            role.as_str()
        ))),
    }
}
