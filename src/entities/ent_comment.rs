// EntComment - append-only comments on a community post

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::error::AppResult;
use crate::infrastructure::SqliteDatabase;
use crate::types::{CommentId, PostId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntComment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for EntComment {
    type Id = CommentId;
    const TABLE: &'static str = "post_comments";
    const NAME: &'static str = "Comment";
}

/// Comment with its author's display fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl EntComment {
    pub async fn create(db: &SqliteDatabase, post_id: PostId, author_id: UserId, text: &str) -> AppResult<Self> {
        let comment = sqlx::query_as::<_, Self>(
            "INSERT INTO post_comments (post_id, author_id, text, created_at) VALUES (?, ?, ?, ?)
             RETURNING *",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(Utc::now())
        .fetch_one(db.pool())
        .await?;
        Ok(comment)
    }

    /// Oldest first, in insertion order.
    pub async fn list_for_post(db: &SqliteDatabase, post_id: PostId) -> AppResult<Vec<CommentView>> {
        let comments = sqlx::query_as::<_, CommentView>(
            "SELECT c.id, c.post_id, c.author_id, u.name AS author_name, u.avatar_url AS author_avatar,
                    c.text, c.created_at
             FROM post_comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(db.pool())
        .await?;
        Ok(comments)
    }

    pub async fn count_for_post(db: &SqliteDatabase, post_id: PostId) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(db.pool())
            .await?;
        Ok(count)
    }
}
