//! Notification handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Notification;
use crate::db::repository::NotificationRepository;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub unread: bool,
}

/// GET /api/notifications?unread=true
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = NotificationRepository::new(state.db.clone())
        .list_for_user(&current.id, params.unread)
        .await?;
    Ok(Json(notifications))
}

#[derive(Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<UnreadCount>> {
    let unread = NotificationRepository::new(state.db.clone())
        .unread_count(&current.id)
        .await?;
    Ok(Json(UnreadCount { unread }))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Notification>> {
    let notification = NotificationRepository::new(state.db.clone())
        .mark_read(&id, &current.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notification {id}")))?;
    Ok(Json(notification))
}

#[derive(Serialize)]
pub struct MarkAllResult {
    pub marked: usize,
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<MarkAllResult>> {
    let marked = NotificationRepository::new(state.db.clone())
        .mark_all_read(&current.id)
        .await?;
    Ok(Json(MarkAllResult { marked }))
}
