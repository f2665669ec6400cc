//! Admin handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::{CurrentUser, gate};
use crate::core::ServerState;
use crate::db::models::{
    ApprovalStatus, AssignRiderPayload, Delivery, DeliveryStatus, NotificationType, Payment, Role,
    UserRole,
};
use crate::db::repository::{
    DeliveryRepository, ShopRepository, StatsRepository, UserRoleRepository,
    stats::PlatformStats,
};
use crate::security_log;
use crate::services::{delivery, escrow, notifier};
use crate::utils::{AppError, AppResponse, AppResult, ok_with_message};

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<PlatformStats>> {
    gate::require_admin(&state.db, &current).await?;

    let stats = StatsRepository::new(state.db.clone()).platform().await?;
    Ok(Json(stats))
}

// =============================================================================
// Role applications
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ApplicationParams {
    pub role: Option<Role>,
}

/// GET /api/admin/applications?role= - pending applications, oldest first
pub async fn list_applications(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(params): Query<ApplicationParams>,
) -> AppResult<Json<Vec<UserRole>>> {
    gate::require_admin(&state.db, &current).await?;

    let rows = UserRoleRepository::new(state.db.clone())
        .list_pending(params.role)
        .await?;
    Ok(Json(rows))
}

/// POST /api/admin/applications/:id/approve
///
/// Seller approval requires prior KYC verification and flips the shop's
/// `approved` mirror so the catalog picks it up without a join.
pub async fn approve_application(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserRole>> {
    gate::require_admin(&state.db, &current).await?;

    let roles = UserRoleRepository::new(state.db.clone());
    let role = roles
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Application {id}")))?;

    if role.status == ApprovalStatus::Approved {
        return Err(AppError::conflict("Application is already approved"));
    }
    if role.role == Role::Seller && !role.kyc_verified {
        return Err(AppError::validation(
            "Seller approval requires KYC verification",
        ));
    }

    let updated = roles.set_status(&id, ApprovalStatus::Approved).await?;

    if role.role == Role::Seller {
        if let Some(shop) = ShopRepository::new(state.db.clone())
            .find_by_owner(&role.user.to_string())
            .await?
        {
            let shop_id = shop
                .id
                .as_ref()
                .ok_or_else(|| AppError::internal("Shop record has no id"))?
                .to_string();
            ShopRepository::new(state.db.clone())
                .set_approved(&shop_id, true)
                .await?;
        }
    }

    notifier::notify(
        &state.db,
        &role.user,
        NotificationType::RoleApplication,
        "Application approved",
        format!("Your {} application has been approved", role.role.as_str()),
        None,
    )
    .await;

    security_log!(
        "INFO",
        "application_approved",
        application = id,
        role = role.role.as_str().to_string(),
        admin = current.id.clone()
    );
    Ok(Json(updated))
}

/// POST /api/admin/applications/:id/reject
pub async fn reject_application(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserRole>> {
    gate::require_admin(&state.db, &current).await?;

    let roles = UserRoleRepository::new(state.db.clone());
    let role = roles
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Application {id}")))?;

    let updated = roles.set_status(&id, ApprovalStatus::Rejected).await?;

    // A rejected seller loses catalog visibility immediately
    if role.role == Role::Seller {
        if let Some(shop) = ShopRepository::new(state.db.clone())
            .find_by_owner(&role.user.to_string())
            .await?
        {
            if let Some(shop_id) = &shop.id {
                ShopRepository::new(state.db.clone())
                    .set_approved(&shop_id.to_string(), false)
                    .await?;
            }
        }
    }

    notifier::notify(
        &state.db,
        &role.user,
        NotificationType::RoleApplication,
        "Application rejected",
        format!("Your {} application has been rejected", role.role.as_str()),
        None,
    )
    .await;

    security_log!(
        "INFO",
        "application_rejected",
        application = id,
        role = role.role.as_str().to_string(),
        admin = current.id.clone()
    );
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct KycPayload {
    pub verified: bool,
}

/// POST /api/admin/applications/:id/kyc
pub async fn set_kyc(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<KycPayload>,
) -> AppResult<Json<AppResponse<()>>> {
    gate::require_admin(&state.db, &current).await?;

    let roles = UserRoleRepository::new(state.db.clone());
    roles
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Application {id}")))?;
    roles.set_kyc_verified(&id, payload.verified).await?;

    Ok(ok_with_message((), "KYC status updated"))
}

// =============================================================================
// Deliveries
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DeliveryParams {
    pub status: Option<DeliveryStatus>,
}

/// GET /api/admin/deliveries?status=
pub async fn list_deliveries(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(params): Query<DeliveryParams>,
) -> AppResult<Json<Vec<Delivery>>> {
    gate::require_admin(&state.db, &current).await?;

    let deliveries = DeliveryRepository::new(state.db.clone())
        .list(params.status)
        .await?;
    Ok(Json(deliveries))
}

/// POST /api/admin/deliveries/:id/assign
pub async fn assign_rider(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AssignRiderPayload>,
) -> AppResult<Json<Delivery>> {
    gate::require_admin(&state.db, &current).await?;

    let assigned = delivery::assign_rider(&state.db, &id, &payload.rider).await?;
    Ok(Json(assigned))
}

// =============================================================================
// Escrow arbitration
// =============================================================================

/// POST /api/admin/orders/:id/release - pay the seller out
pub async fn release_escrow(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<escrow::ReleaseResult>> {
    gate::require_admin(&state.db, &current).await?;

    let result = escrow::release(&state.db, &id).await?;

    security_log!(
        "INFO",
        "escrow_released",
        order = id,
        payout = result.payout.to_string(),
        admin = current.id.clone()
    );
    Ok(Json(result))
}

/// POST /api/admin/orders/:id/refund - buyer wins the dispute
pub async fn refund_order(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Payment>> {
    gate::require_admin(&state.db, &current).await?;

    let refunded = escrow::refund(&state.db, &id).await?;

    security_log!("INFO", "escrow_refunded", order = id, admin = current.id.clone());
    Ok(Json(refunded))
}

/// POST /api/admin/orders/:id/reject-dispute - seller wins, funds stay
/// held for a normal release
pub async fn reject_dispute(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    gate::require_admin(&state.db, &current).await?;

    escrow::reject_dispute(&state.db, &id).await?;

    security_log!("INFO", "dispute_rejected", order = id, admin = current.id.clone());
    Ok(ok_with_message((), "Dispute rejected; order returned to DELIVERED"))
}
