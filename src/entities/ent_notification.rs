// EntNotification - directed, typed, read-tracked messages between users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;

use super::Entity;
use crate::error::AppResult;
use crate::infrastructure::SqliteDatabase;
use crate::types::{NotificationId, Page, PostId, TripId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Share,
    Clone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntNotification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub sender_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub trip_id: TripId,
    pub post_id: Option<PostId>,
    pub message: String,
    pub is_read: bool,
    pub metadata: Json<Value>,
    pub created_at: DateTime<Utc>,
}

impl Entity for EntNotification {
    type Id = NotificationId;
    const TABLE: &'static str = "notifications";
    const NAME: &'static str = "Notification";
}

/// Notification expanded with sender, trip and post display fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub notification: EntNotification,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub trip_name: String,
    pub trip_cover_image: Option<String>,
    pub post_title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub sender_id: UserId,
    pub kind: NotificationKind,
    pub trip_id: TripId,
    pub post_id: Option<PostId>,
    pub message: String,
    pub metadata: Value,
}

impl EntNotification {
    pub async fn insert(db: &SqliteDatabase, new: &NewNotification) -> AppResult<Self> {
        let notification = sqlx::query_as::<_, Self>(
            "INSERT INTO notifications (recipient_id, sender_id, kind, trip_id, post_id, message, is_read, metadata, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
             RETURNING *",
        )
        .bind(new.recipient_id)
        .bind(new.sender_id)
        .bind(new.kind)
        .bind(new.trip_id)
        .bind(new.post_id)
        .bind(&new.message)
        .bind(Json(&new.metadata))
        .bind(Utc::now())
        .fetch_one(db.pool())
        .await?;
        Ok(notification)
    }

    /// Newest first.
    pub async fn page_for_recipient(
        db: &SqliteDatabase,
        recipient_id: UserId,
        page: Page,
    ) -> AppResult<Vec<NotificationRow>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT n.*, s.name AS sender_name, s.avatar_url AS sender_avatar,
                    t.name AS trip_name, t.cover_image AS trip_cover_image,
                    p.title AS post_title
             FROM notifications n
             JOIN users s ON s.id = n.sender_id
             JOIN trips t ON t.id = n.trip_id
             LEFT JOIN community_posts p ON p.id = n.post_id
             WHERE n.recipient_id = ?
             ORDER BY n.created_at DESC, n.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(recipient_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(db.pool())
        .await?;
        Ok(rows)
    }

    pub async fn count_for_recipient(db: &SqliteDatabase, recipient_id: UserId) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient_id = ?")
            .bind(recipient_id)
            .fetch_one(db.pool())
            .await?;
        Ok(count)
    }

    pub async fn unread_count(db: &SqliteDatabase, recipient_id: UserId) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = 0",
        )
        .bind(recipient_id)
        .fetch_one(db.pool())
        .await?;
        Ok(count)
    }

    /// Ownership is part of the filter: another user's notification is "not found".
    pub async fn mark_read(
        db: &SqliteDatabase,
        id: NotificationId,
        recipient_id: UserId,
    ) -> AppResult<Option<Self>> {
        let notification = sqlx::query_as::<_, Self>(
            "UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ? RETURNING *",
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(db.pool())
        .await?;
        Ok(notification)
    }

    pub async fn mark_all_read(db: &SqliteDatabase, recipient_id: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0",
        )
        .bind(recipient_id)
        .execute(db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_for_recipient(
        db: &SqliteDatabase,
        id: NotificationId,
        recipient_id: UserId,
    ) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND recipient_id = ?")
            .bind(id)
            .bind(recipient_id)
            .execute(db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
