// CommunityService - publishing trips and the social actions around them

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::access::owned_trip;
use super::notification_service::NotificationService;
use crate::entities::ent_comment::CommentView;
use crate::entities::ent_community_post::{FeedCriterion, FeedQuery, FeedSort, NewPost, PostView};
use crate::entities::ent_trip::{TripFields, TripSummary};
use crate::entities::ent_user::UserSummary;
use crate::entities::{
    EntComment, EntCommunityPost, EntNotification, EntSharedTrip, EntTrip, Entity, PostStatus,
    TripStatus,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::security::random_token;
use crate::infrastructure::SqliteDatabase;
use crate::types::{Page, PageInfo, PostId, TripId, UserId};

pub const MAX_COMMENT_CHARS: usize = 1000;
pub const TRENDING_LIMIT: i64 = 5;
const SLUG_BYTES: usize = 12;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub trip_id: TripId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClonePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct FeedRequest {
    pub search: Option<String>,
    pub sort: FeedSort,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub posts: Vec<PostView>,
    pub pagination: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostView,
    pub trip: Option<TripSummary>,
    pub comments: Vec<CommentView>,
    pub likers: Vec<UserSummary>,
    pub cloned_by_viewer: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResult {
    pub trip_id: TripId,
    pub slug: String,
}

/// Notifications are a side effect of an action that has already committed.
/// A failure here is logged and the action still succeeds.
fn log_side_effect(action: &str, result: AppResult<Option<EntNotification>>) {
    if let Err(e) = result {
        warn!(action, error = %e, "Notification side effect failed");
    }
}

#[derive(Clone)]
pub struct CommunityService {
    db: SqliteDatabase,
    notifications: NotificationService,
}

impl CommunityService {
    pub fn new(db: SqliteDatabase, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    /// A post the viewer may see: not deleted, and public unless the viewer wrote it.
    async fn visible_post(&self, id: PostId, viewer: Option<UserId>) -> AppResult<PostView> {
        let view = EntCommunityPost::view(&self.db, id, viewer)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Community post {} not found", id)))?;

        if !view.post.is_public && viewer != Some(view.post.author_id) {
            return Err(AppError::NotFound(format!("Community post {} not found", id)));
        }
        Ok(view)
    }

    /// Likes, comments, clones and shares need a live post.
    async fn active_post(&self, id: PostId, viewer: UserId) -> AppResult<PostView> {
        let view = self.visible_post(id, Some(viewer)).await?;
        if view.post.status != PostStatus::Active {
            return Err(AppError::BadRequest("This post is archived".to_string()));
        }
        Ok(view)
    }

    #[instrument(skip(self))]
    pub async fn list_posts(
        &self,
        request: &FeedRequest,
        page: Page,
        viewer: Option<UserId>,
    ) -> AppResult<FeedPage> {
        let mut query = FeedQuery::public_feed().sorted_by(request.sort);
        if let Some(search) = request.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.with(FeedCriterion::Search(search.to_string()));
        }

        let posts = EntCommunityPost::feed(&self.db, &query, Some(page), viewer).await?;
        let total = EntCommunityPost::feed_count(&self.db, &query).await?;
        Ok(FeedPage {
            posts,
            pagination: page.info(total),
        })
    }

    pub async fn trending(&self, viewer: Option<UserId>) -> AppResult<Vec<PostView>> {
        let query = FeedQuery::public_feed().sorted_by(FeedSort::Top);
        EntCommunityPost::feed(&self.db, &query, Some(Page::new(1, TRENDING_LIMIT)), viewer).await
    }

    /// Every post the user authored that is not deleted, newest first.
    pub async fn my_posts(&self, user_id: UserId) -> AppResult<Vec<PostView>> {
        let query = FeedQuery::new()
            .with(FeedCriterion::Author(user_id))
            .with(FeedCriterion::NotStatus(PostStatus::Deleted));
        EntCommunityPost::feed(&self.db, &query, None, Some(user_id)).await
    }

    #[instrument(skip(self, request), fields(trip = %request.trip_id))]
    pub async fn create_post(&self, user_id: UserId, request: CreatePostRequest) -> AppResult<PostView> {
        let trip = owned_trip(&self.db, request.trip_id, user_id).await?;

        let title = request
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| trip.name.clone());
        let tags = request
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let id = EntCommunityPost::create(
            &self.db,
            &NewPost {
                author_id: user_id,
                trip_id: trip.id,
                title,
                description: request.description.unwrap_or_else(|| trip.description.clone()),
                cover_image: request.cover_image.or_else(|| trip.cover_image.clone()),
                tags,
                is_public: request.is_public.unwrap_or(true),
            },
        )
        .await?;
        info!("Published trip {} as post {}", trip.id, id);

        self.visible_post(id, Some(user_id)).await
    }

    #[instrument(skip(self))]
    pub async fn toggle_like(&self, id: PostId, user_id: UserId) -> AppResult<LikeToggle> {
        let view = self.active_post(id, user_id).await?;

        let liked = if EntCommunityPost::add_like(&self.db, id, user_id).await? {
            true
        } else {
            EntCommunityPost::remove_like(&self.db, id, user_id).await?;
            false
        };
        let like_count = EntCommunityPost::like_count(&self.db, id).await?;

        if liked {
            log_side_effect(
                "like",
                self.notifications
                    .create_like_notification(user_id, view.post.trip_id, Some(id))
                    .await,
            );
        }

        Ok(LikeToggle { liked, like_count })
    }

    #[instrument(skip(self, text))]
    pub async fn add_comment(&self, id: PostId, user_id: UserId, text: &str) -> AppResult<CommentView> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment text is required".to_string()));
        }
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::Validation(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_CHARS
            )));
        }

        let view = self.active_post(id, user_id).await?;
        let comment = EntComment::create(&self.db, id, user_id, text).await?;

        log_side_effect(
            "comment",
            self.notifications
                .create_comment_notification(user_id, view.post.trip_id, id, text)
                .await,
        );

        let comments = EntComment::list_for_post(&self.db, id).await?;
        comments
            .into_iter()
            .find(|c| c.id == comment.id)
            .ok_or_else(|| AppError::Internal(format!("Comment {} vanished after insert", comment.id)))
    }

    pub async fn list_comments(&self, id: PostId, viewer: Option<UserId>) -> AppResult<Vec<CommentView>> {
        self.visible_post(id, viewer).await?;
        EntComment::list_for_post(&self.db, id).await
    }

    /// Copy the post's trip into a new trip owned by the cloner. The clone
    /// record and the new trip commit together or not at all.
    #[instrument(skip(self, request))]
    pub async fn clone_trip(
        &self,
        id: PostId,
        user_id: UserId,
        request: ClonePostRequest,
    ) -> AppResult<EntTrip> {
        let view = self.active_post(id, user_id).await?;
        let original = EntTrip::gen_enforce(&self.db, view.post.trip_id).await?;

        let mut fields = TripFields::from(&original);
        fields.name = request
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{} (Copy)", original.name));
        if let Some(description) = request.description {
            fields.description = description;
        }
        fields.status = TripStatus::Planning;

        let mut tx = self.db.begin().await?;
        let new_trip_id = EntTrip::create(&mut *tx, user_id, &fields).await?;
        EntCommunityPost::record_clone(&mut *tx, id, user_id, new_trip_id).await?;
        tx.commit().await?;
        info!("User {} cloned trip {} into {}", user_id, original.id, new_trip_id);

        log_side_effect(
            "clone",
            self.notifications
                .create_clone_notification(user_id, original.id, id)
                .await,
        );

        EntTrip::gen_enforce(&self.db, new_trip_id).await
    }

    /// Every fetch counts as one view.
    #[instrument(skip(self))]
    pub async fn get_post(&self, id: PostId, viewer: Option<UserId>) -> AppResult<PostDetail> {
        self.visible_post(id, viewer).await?;
        EntCommunityPost::increment_views(&self.db, id).await?;
        let post = self.visible_post(id, viewer).await?;

        let trip = EntTrip::summary(&self.db, post.post.trip_id).await?;
        let comments = EntComment::list_for_post(&self.db, id).await?;
        let likers = EntCommunityPost::likers(&self.db, id).await?;
        let cloned_by_viewer = match viewer {
            Some(user_id) => EntCommunityPost::has_cloned(&self.db, id, user_id).await?,
            None => false,
        };

        Ok(PostDetail {
            post,
            trip,
            comments,
            likers,
            cloned_by_viewer,
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: PostId, user_id: UserId) -> AppResult<()> {
        let post = EntCommunityPost::gen_nullable(&self.db, id)
            .await?
            .filter(|p| p.status != PostStatus::Deleted)
            .ok_or_else(|| AppError::NotFound(format!("Community post {} not found", id)))?;

        if post.author_id != user_id {
            return Err(AppError::Forbidden("Only the author can delete this post".to_string()));
        }

        EntCommunityPost::set_status(&self.db, id, PostStatus::Deleted).await?;
        info!("Post {} deleted by its author", id);
        Ok(())
    }

    /// Ensures the trip behind the post has a public link and tells its owner.
    #[instrument(skip(self))]
    pub async fn share_post(&self, id: PostId, user_id: UserId) -> AppResult<ShareResult> {
        let view = self.active_post(id, user_id).await?;
        let shared = EntSharedTrip::get_or_create(&self.db, view.post.trip_id, &random_token(SLUG_BYTES)).await?;

        log_side_effect(
            "share",
            self.notifications
                .create_share_notification(user_id, view.post.trip_id)
                .await,
        );

        Ok(ShareResult {
            trip_id: shared.trip_id,
            slug: shared.slug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures;
    use crate::entities::EntUser;

    struct Scene {
        db: SqliteDatabase,
        service: CommunityService,
        notifications: NotificationService,
        alice: EntUser,
        bob: EntUser,
        trip: EntTrip,
        post: PostId,
    }

    async fn scene() -> Scene {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let bob = fixtures::user(&db, "Bob").await;
        let trip = fixtures::trip(&db, alice.id, "Portugal").await;
        let notifications = NotificationService::new(db.clone());
        let service = CommunityService::new(db.clone(), notifications.clone());
        let post = service
            .create_post(
                alice.id,
                CreatePostRequest {
                    trip_id: trip.id,
                    title: None,
                    description: None,
                    cover_image: None,
                    tags: vec!["europe".into()],
                    is_public: None,
                },
            )
            .await
            .unwrap()
            .post
            .id;
        Scene {
            db,
            service,
            notifications,
            alice,
            bob,
            trip,
            post,
        }
    }

    async fn inbox(s: &Scene, user: UserId) -> i64 {
        s.notifications
            .get_user_notifications(user, Page::new(1, 50))
            .await
            .unwrap()
            .pagination
            .total
    }

    #[tokio::test]
    async fn test_create_post_defaults_from_trip() {
        let s = scene().await;
        let view = s.service.get_post(s.post, None).await.unwrap();
        assert_eq!(view.post.post.title, "Portugal");
        assert_eq!(view.post.post.description, "Portugal description");
        assert_eq!(view.post.post.cover_image.as_deref(), Some("cover.jpg"));
        assert!(view.post.post.is_public);
        assert_eq!(view.trip.unwrap().id, s.trip.id);
    }

    #[tokio::test]
    async fn test_create_post_requires_trip_owner() {
        let s = scene().await;
        let request = |trip_id| CreatePostRequest {
            trip_id,
            title: None,
            description: None,
            cover_image: None,
            tags: vec![],
            is_public: None,
        };

        let err = s.service.create_post(s.bob.id, request(s.trip.id)).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = s.service.create_post(s.bob.id, request(TripId::new(999))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_like_then_unlike_restores_count_and_keeps_notification() {
        let s = scene().await;

        let first = s.service.toggle_like(s.post, s.bob.id).await.unwrap();
        assert_eq!(first, LikeToggle { liked: true, like_count: 1 });
        assert_eq!(inbox(&s, s.alice.id).await, 1);

        let second = s.service.toggle_like(s.post, s.bob.id).await.unwrap();
        assert_eq!(second, LikeToggle { liked: false, like_count: 0 });
        assert_eq!(inbox(&s, s.alice.id).await, 1);
    }

    #[tokio::test]
    async fn test_self_like_sends_no_notification() {
        let s = scene().await;
        let toggle = s.service.toggle_like(s.post, s.alice.id).await.unwrap();
        assert!(toggle.liked);
        assert_eq!(inbox(&s, s.alice.id).await, 0);
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected_without_side_effects() {
        let s = scene().await;
        let err = s.service.add_comment(s.post, s.bob.id, "   \n ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(s.service.list_comments(s.post, None).await.unwrap().is_empty());
        assert_eq!(inbox(&s, s.alice.id).await, 0);
    }

    #[tokio::test]
    async fn test_comment_length_limit() {
        let s = scene().await;
        let too_long = "a".repeat(MAX_COMMENT_CHARS + 1);
        let err = s.service.add_comment(s.post, s.bob.id, &too_long).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let exact = "a".repeat(MAX_COMMENT_CHARS);
        s.service.add_comment(s.post, s.bob.id, &exact).await.unwrap();
    }

    #[tokio::test]
    async fn test_comments_append_in_order_and_notify() {
        let s = scene().await;
        let first = s.service.add_comment(s.post, s.bob.id, "  Lovely!  ").await.unwrap();
        assert_eq!(first.text, "Lovely!");
        assert_eq!(first.author_name, "Bob");
        s.service.add_comment(s.post, s.alice.id, "Thanks").await.unwrap();

        let comments = s.service.list_comments(s.post, None).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Lovely!", "Thanks"]);
        assert_eq!(inbox(&s, s.alice.id).await, 1);
    }

    #[tokio::test]
    async fn test_clone_once_per_user() {
        let s = scene().await;

        let copy = s
            .service
            .clone_trip(s.post, s.bob.id, ClonePostRequest::default())
            .await
            .unwrap();
        assert_eq!(copy.owner_id, s.bob.id);
        assert_eq!(copy.name, "Portugal (Copy)");
        assert_eq!(copy.destination, s.trip.destination);
        assert_eq!(copy.start_date, s.trip.start_date);
        assert_eq!(copy.status, TripStatus::Planning);

        let err = s
            .service
            .clone_trip(s.post, s.bob.id, ClonePostRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Trip already cloned"));

        assert_eq!(EntTrip::list_by_owner(&s.db, s.bob.id).await.unwrap().len(), 1);
        assert_eq!(inbox(&s, s.alice.id).await, 1);
    }

    #[tokio::test]
    async fn test_clone_uses_requested_title() {
        let s = scene().await;
        let copy = s
            .service
            .clone_trip(
                s.post,
                s.bob.id,
                ClonePostRequest {
                    title: Some("My Lisbon".into()),
                    description: Some("Bob's version".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(copy.name, "My Lisbon");
        assert_eq!(copy.description, "Bob's version");
    }

    #[tokio::test]
    async fn test_each_fetch_counts_one_view() {
        let s = scene().await;
        for _ in 0..3 {
            s.service.get_post(s.post, Some(s.bob.id)).await.unwrap();
        }
        let detail = s.service.get_post(s.post, None).await.unwrap();
        assert_eq!(detail.post.post.views, 4);
    }

    #[tokio::test]
    async fn test_only_author_deletes_and_deleted_is_gone() {
        let s = scene().await;

        let err = s.service.delete_post(s.post, s.bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(s.service.get_post(s.post, None).await.is_ok());

        s.service.delete_post(s.post, s.alice.id).await.unwrap();
        let err = s.service.get_post(s.post, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let stored = EntCommunityPost::gen_enforce(&s.db, s.post).await.unwrap();
        assert_eq!(stored.status, PostStatus::Deleted);

        let feed = s
            .service
            .list_posts(&FeedRequest::default(), Page::new(1, 10), None)
            .await
            .unwrap();
        assert_eq!(feed.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_archived_post_rejects_social_actions() {
        let s = scene().await;
        EntCommunityPost::set_status(&s.db, s.post, PostStatus::Archived).await.unwrap();

        let err = s.service.toggle_like(s.post, s.bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(s.service.get_post(s.post, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_feed_sorts_and_flags_viewer_likes() {
        let s = scene().await;
        let other_trip = fixtures::trip(&s.db, s.bob.id, "Japan").await;
        let bobs = s
            .service
            .create_post(
                s.bob.id,
                CreatePostRequest {
                    trip_id: other_trip.id,
                    title: Some("Tokyo".into()),
                    description: None,
                    cover_image: None,
                    tags: vec![],
                    is_public: Some(true),
                },
            )
            .await
            .unwrap();
        s.service.toggle_like(s.post, s.bob.id).await.unwrap();

        let latest = s
            .service
            .list_posts(&FeedRequest::default(), Page::new(1, 10), Some(s.bob.id))
            .await
            .unwrap();
        assert_eq!(latest.posts[0].post.id, bobs.post.id);

        let popular = s
            .service
            .list_posts(
                &FeedRequest {
                    search: None,
                    sort: FeedSort::Popular,
                },
                Page::new(1, 10),
                Some(s.bob.id),
            )
            .await
            .unwrap();
        assert_eq!(popular.posts[0].post.id, s.post);
        assert_eq!(popular.posts[0].like_count, 1);
        assert!(popular.posts[0].liked_by_viewer);
        assert!(!popular.posts[1].liked_by_viewer);

        let search = s
            .service
            .list_posts(
                &FeedRequest {
                    search: Some("tokyo".into()),
                    sort: FeedSort::Latest,
                },
                Page::new(1, 10),
                None,
            )
            .await
            .unwrap();
        assert_eq!(search.pagination.total, 1);

        let trending = s.service.trending(None).await.unwrap();
        assert_eq!(trending[0].post.id, s.post);
    }

    #[tokio::test]
    async fn test_private_post_hidden_from_others() {
        let s = scene().await;
        let view = s
            .service
            .create_post(
                s.alice.id,
                CreatePostRequest {
                    trip_id: s.trip.id,
                    title: Some("Draft".into()),
                    description: None,
                    cover_image: None,
                    tags: vec![],
                    is_public: Some(false),
                },
            )
            .await
            .unwrap();

        let err = s.service.get_post(view.post.id, Some(s.bob.id)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(s.service.get_post(view.post.id, Some(s.alice.id)).await.is_ok());
        assert_eq!(s.service.my_posts(s.alice.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_share_creates_stable_slug() {
        let s = scene().await;
        let first = s.service.share_post(s.post, s.bob.id).await.unwrap();
        let second = s.service.share_post(s.post, s.bob.id).await.unwrap();
        assert_eq!(first.slug, second.slug);
        assert_eq!(first.trip_id, s.trip.id);
        assert_eq!(inbox(&s, s.alice.id).await, 2);
    }
}
