//! Best-effort notification fan-out
//!
//! A failed notification insert must never fail the transition that
//! triggered it; failures are logged and swallowed.

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;
use tracing::warn;

use crate::db::models::NotificationType;
use crate::db::repository::NotificationRepository;

pub async fn notify(
    db: &Surreal<Db>,
    user: &RecordId,
    notification_type: NotificationType,
    title: impl Into<String>,
    message: impl Into<String>,
    link: Option<String>,
) {
    let repo = NotificationRepository::new(db.clone());
    if let Err(e) = repo
        .create(user, notification_type, title.into(), message.into(), link)
        .await
    {
        warn!(target: "notifier", user = %user, error = %e, "Failed to create notification");
    }
}
