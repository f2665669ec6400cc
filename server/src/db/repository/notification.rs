//! Notification repository

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{Notification, NotificationType};
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const NOTIFICATION_TABLE: &str = "notification";
const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct NotificationRepository {
    base: BaseRepository,
}

impl NotificationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(
        &self,
        user_id: &RecordId,
        notification_type: NotificationType,
        title: String,
        message: String,
        link: Option<String>,
    ) -> RepoResult<Notification> {
        let notifications: Vec<Notification> = self
            .base
            .db()
            .query(
                "CREATE notification SET \
                 user = $user, \
                 `type` = $type, \
                 title = $title, \
                 message = $message, \
                 link = $link, \
                 read = false, \
                 read_at = NONE, \
                 created_at = $created_at",
            )
            .bind(("user", user_id.clone()))
            .bind(("type", notification_type))
            .bind(("title", title))
            .bind(("message", message))
            .bind(("link", link))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)?;
        notifications
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create notification".to_string()))
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> RepoResult<Vec<Notification>> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let notifications: Vec<Notification> = self
            .base
            .db()
            .query(
                "SELECT * FROM notification \
                 WHERE user = $user AND ($unread_only = false OR read = false) \
                 ORDER BY created_at DESC",
            )
            .bind(("user", user_rid))
            .bind(("unread_only", unread_only))
            .await?
            .take(0)?;
        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: &str) -> RepoResult<i64> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;

        #[derive(serde::Deserialize)]
        struct Count {
            total: i64,
        }

        let counts: Vec<Count> = self
            .base
            .db()
            .query(
                "SELECT count() AS total FROM notification \
                 WHERE user = $user AND read = false GROUP ALL",
            )
            .bind(("user", user_rid))
            .await?
            .take(0)?;
        Ok(counts.into_iter().next().map(|c| c.total).unwrap_or(0))
    }

    /// Mark one notification read, scoped to its owner. Returns None when
    /// the id does not exist or belongs to another user.
    pub async fn mark_read(
        &self,
        notification_id: &str,
        user_id: &str,
    ) -> RepoResult<Option<Notification>> {
        let rid = parse_record_id(NOTIFICATION_TABLE, notification_id)?;
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let notifications: Vec<Notification> = self
            .base
            .db()
            .query(
                "UPDATE notification SET read = true, read_at = $now \
                 WHERE id = $id AND user = $user AND read = false RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("user", user_rid))
            .bind(("now", now_rfc3339()))
            .await?
            .take(0)?;
        Ok(notifications.into_iter().next())
    }

    /// Mark every unread notification read; returns how many changed
    pub async fn mark_all_read(&self, user_id: &str) -> RepoResult<usize> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let notifications: Vec<Notification> = self
            .base
            .db()
            .query(
                "UPDATE notification SET read = true, read_at = $now \
                 WHERE user = $user AND read = false RETURN AFTER",
            )
            .bind(("user", user_rid))
            .bind(("now", now_rfc3339()))
            .await?
            .take(0)?;
        Ok(notifications.len())
    }
}
