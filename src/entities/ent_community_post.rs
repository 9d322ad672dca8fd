// EntCommunityPost - the public wrapper around a trip, plus its likes and clones

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, Executor, QueryBuilder, Sqlite};

use super::ent_user::UserSummary;
use super::{like_pattern, Entity};
use crate::error::{AppError, AppResult};
use crate::infrastructure::SqliteDatabase;
use crate::types::{Page, PostId, TripId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PostStatus {
    Active,
    Archived,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntCommunityPost {
    pub id: PostId,
    pub author_id: UserId,
    pub trip_id: TripId,
    pub title: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub tags: Json<Vec<String>>,
    pub is_public: bool,
    pub status: PostStatus,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for EntCommunityPost {
    type Id = PostId;
    const TABLE: &'static str = "community_posts";
    const NAME: &'static str = "Community post";
}

/// Feed row: the post with author, trip summary and computed social counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: EntCommunityPost,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub trip_name: String,
    pub trip_destination: String,
    pub trip_start_date: NaiveDate,
    pub trip_end_date: NaiveDate,
    pub like_count: i64,
    pub comment_count: i64,
    pub clone_count: i64,
    pub liked_by_viewer: bool,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: UserId,
    pub trip_id: TripId,
    pub title: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
}

/// One filter over the feed. The set is closed: every way the feed can be
/// narrowed is a variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedCriterion {
    PublicOnly,
    Status(PostStatus),
    NotStatus(PostStatus),
    Search(String),
    Author(UserId),
    Post(PostId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    #[default]
    Latest,
    /// Likes, then views
    Popular,
    /// Comments, then likes
    Trending,
    /// Likes, then views, then comments
    Top,
}

impl FeedSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "latest" => Some(FeedSort::Latest),
            "popular" => Some(FeedSort::Popular),
            "trending" => Some(FeedSort::Trending),
            _ => None,
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            FeedSort::Latest => " ORDER BY p.created_at DESC, p.id DESC",
            FeedSort::Popular => " ORDER BY like_count DESC, p.views DESC, p.id DESC",
            FeedSort::Trending => " ORDER BY comment_count DESC, like_count DESC, p.id DESC",
            FeedSort::Top => {
                " ORDER BY like_count DESC, p.views DESC, comment_count DESC, p.id DESC"
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    criteria: Vec<FeedCriterion>,
    sort: FeedSort,
}

const VIEW_SELECT: &str = "SELECT p.*, u.name AS author_name, u.avatar_url AS author_avatar,
        t.name AS trip_name, t.destination AS trip_destination,
        t.start_date AS trip_start_date, t.end_date AS trip_end_date,
        (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count,
        (SELECT COUNT(*) FROM post_comments c WHERE c.post_id = p.id) AS comment_count,
        (SELECT COUNT(*) FROM post_clones k WHERE k.post_id = p.id) AS clone_count,
        EXISTS (SELECT 1 FROM post_likes v WHERE v.post_id = p.id AND v.user_id = ";

const VIEW_FROM: &str = ") AS liked_by_viewer
    FROM community_posts p
    JOIN users u ON u.id = p.author_id
    JOIN trips t ON t.id = p.trip_id";

impl FeedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Public, active posts only.
    pub fn public_feed() -> Self {
        Self::new()
            .with(FeedCriterion::PublicOnly)
            .with(FeedCriterion::Status(PostStatus::Active))
    }

    pub fn with(mut self, criterion: FeedCriterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn sorted_by(mut self, sort: FeedSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn criteria(&self) -> &[FeedCriterion] {
        &self.criteria
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        for criterion in &self.criteria {
            match criterion {
                FeedCriterion::PublicOnly => {
                    qb.push(" AND p.is_public = 1");
                }
                FeedCriterion::Status(status) => {
                    qb.push(" AND p.status = ");
                    qb.push_bind(*status);
                }
                FeedCriterion::NotStatus(status) => {
                    qb.push(" AND p.status <> ");
                    qb.push_bind(*status);
                }
                FeedCriterion::Search(term) => {
                    let folded = term.to_lowercase().replace(SEARCH_SEPARATOR, "");
                    qb.push(" AND p.search_text LIKE ");
                    qb.push_bind(like_pattern(&folded));
                    qb.push(" ESCAPE '\\'");
                }
                FeedCriterion::Author(author_id) => {
                    qb.push(" AND p.author_id = ");
                    qb.push_bind(*author_id);
                }
                FeedCriterion::Post(post_id) => {
                    qb.push(" AND p.id = ");
                    qb.push_bind(*post_id);
                }
            }
        }
    }
}

// Fields of `search_text` are joined with this so a term never spans two of them.
const SEARCH_SEPARATOR: char = '\u{1f}';

/// Title, description and each tag, lowercased. Written once at insert; none
/// of them change afterwards.
fn search_text(new: &NewPost) -> String {
    std::iter::once(new.title.as_str())
        .chain(std::iter::once(new.description.as_str()))
        .chain(new.tags.iter().map(String::as_str))
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(&SEARCH_SEPARATOR.to_string())
}

impl EntCommunityPost {
    pub async fn create(db: &SqliteDatabase, new: &NewPost) -> AppResult<PostId> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO community_posts (author_id, trip_id, title, description, cover_image, tags,
                                          search_text, is_public, status, views, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(new.author_id)
        .bind(new.trip_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.cover_image)
        .bind(Json(&new.tags))
        .bind(search_text(new))
        .bind(new.is_public)
        .bind(PostStatus::Active)
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await?;
        Ok(PostId::new(result.last_insert_rowid()))
    }

    pub async fn feed(
        db: &SqliteDatabase,
        query: &FeedQuery,
        page: Option<Page>,
        viewer: Option<UserId>,
    ) -> AppResult<Vec<PostView>> {
        let mut qb = QueryBuilder::<Sqlite>::new(VIEW_SELECT);
        qb.push_bind(viewer);
        qb.push(VIEW_FROM);
        query.push_where(&mut qb);
        qb.push(query.sort.order_by());
        if let Some(page) = page {
            qb.push(" LIMIT ");
            qb.push_bind(page.limit);
            qb.push(" OFFSET ");
            qb.push_bind(page.offset());
        }

        let posts = qb.build_query_as::<PostView>().fetch_all(db.pool()).await?;
        Ok(posts)
    }

    pub async fn feed_count(db: &SqliteDatabase, query: &FeedQuery) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM community_posts p");
        query.push_where(&mut qb);
        let total: i64 = qb.build_query_scalar().fetch_one(db.pool()).await?;
        Ok(total)
    }

    pub async fn view(db: &SqliteDatabase, id: PostId, viewer: Option<UserId>) -> AppResult<Option<PostView>> {
        let query = FeedQuery::new()
            .with(FeedCriterion::Post(id))
            .with(FeedCriterion::NotStatus(PostStatus::Deleted));
        let mut posts = Self::feed(db, &query, None, viewer).await?;
        Ok(posts.pop())
    }

    /// One view per call, no dedup by viewer. Deleted posts are not counted.
    pub async fn increment_views(db: &SqliteDatabase, id: PostId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE community_posts SET views = views + 1 WHERE id = ? AND status <> 'deleted'",
        )
        .bind(id)
        .execute(db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_status(db: &SqliteDatabase, id: PostId, status: PostStatus) -> AppResult<bool> {
        let result = sqlx::query("UPDATE community_posts SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active posts of the trip move to archived. Returns how many changed.
    pub async fn archive_for_trip(db: &SqliteDatabase, trip_id: TripId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE community_posts SET status = 'archived', updated_at = ?
             WHERE trip_id = ? AND status = 'active'",
        )
        .bind(Utc::now())
        .bind(trip_id)
        .execute(db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert-if-absent on the (post, user) key. `true` when a new like was recorded.
    pub async fn add_like(db: &SqliteDatabase, id: PostId, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)
             ON CONFLICT (post_id, user_id) DO NOTHING",
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(db.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn remove_like(db: &SqliteDatabase, id: PostId, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn like_count(db: &SqliteDatabase, id: PostId) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = ?")
            .bind(id)
            .fetch_one(db.pool())
            .await?;
        Ok(count)
    }

    pub async fn likers(db: &SqliteDatabase, id: PostId) -> AppResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.name, u.avatar_url FROM post_likes l
             JOIN users u ON u.id = l.user_id
             WHERE l.post_id = ? ORDER BY l.created_at ASC",
        )
        .bind(id)
        .fetch_all(db.pool())
        .await?;
        Ok(users)
    }

    /// Record a clone inside the caller's transaction. The (post, user) key
    /// makes a second clone of the same post by the same user a conflict.
    pub async fn record_clone<'e, E>(
        executor: E,
        id: PostId,
        user_id: UserId,
        cloned_trip_id: TripId,
    ) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO post_clones (post_id, user_id, cloned_trip_id, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT (post_id, user_id) DO NOTHING",
        )
        .bind(id)
        .bind(user_id)
        .bind(cloned_trip_id)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Trip already cloned".to_string()));
        }
        Ok(())
    }

    pub async fn has_cloned(db: &SqliteDatabase, id: PostId, user_id: UserId) -> AppResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM post_clones WHERE post_id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(db.pool())
                .await?;
        Ok(found.is_some())
    }
}
