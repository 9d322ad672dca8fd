// NotificationService - turns social actions into addressed, read-tracked messages

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::entities::ent_notification::{NewNotification, NotificationRow};
use crate::entities::{EntNotification, EntTrip, EntUser, Entity, NotificationKind};
use crate::error::AppResult;
use crate::infrastructure::SqliteDatabase;
use crate::types::{NotificationId, Page, PageInfo, PostId, TripId, UserId};

/// Comment excerpts in notification messages are cut to this many characters.
pub const COMMENT_EXCERPT_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSender {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTrip {
    pub id: TripId,
    pub name: String,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPost {
    pub id: PostId,
    pub title: String,
}

/// One notification as the client renders it
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub metadata: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub sender: NotificationSender,
    pub trip: NotificationTrip,
    pub community_post: Option<NotificationPost>,
}

impl From<NotificationRow> for NotificationItem {
    fn from(row: NotificationRow) -> Self {
        let n = row.notification;
        let community_post = match (n.post_id, row.post_title) {
            (Some(id), Some(title)) => Some(NotificationPost { id, title }),
            _ => None,
        };
        Self {
            id: n.id,
            kind: n.kind,
            message: n.message,
            is_read: n.is_read,
            metadata: n.metadata.0,
            created_at: n.created_at,
            sender: NotificationSender {
                id: n.sender_id,
                name: row.sender_name,
                avatar_url: row.sender_avatar,
            },
            trip: NotificationTrip {
                id: n.trip_id,
                name: row.trip_name,
                cover_image: row.trip_cover_image,
            },
            community_post,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<NotificationItem>,
    pub pagination: PageInfo,
    pub unread_count: i64,
}

/// First `max_chars` characters, with `...` appended when anything was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

#[derive(Clone)]
pub struct NotificationService {
    db: SqliteDatabase,
}

impl NotificationService {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    /// Single choke point for every notification. Self-actions produce nothing.
    #[instrument(skip(self, new), fields(kind = ?new.kind, sender = %new.sender_id, recipient = %new.recipient_id))]
    pub async fn create_notification(&self, new: NewNotification) -> AppResult<Option<EntNotification>> {
        if new.sender_id == new.recipient_id {
            debug!("Suppressed self-notification");
            return Ok(None);
        }
        let notification = EntNotification::insert(&self.db, &new).await?;
        info!("Created notification {}", notification.id);
        Ok(Some(notification))
    }

    /// Trip (for its owner and name) and sender (for its display name).
    async fn resolve(&self, sender_id: UserId, trip_id: TripId) -> AppResult<(EntTrip, EntUser)> {
        let trip = EntTrip::gen_enforce(&self.db, trip_id).await?;
        let sender = EntUser::gen_enforce(&self.db, sender_id).await?;
        Ok((trip, sender))
    }

    pub async fn create_like_notification(
        &self,
        sender_id: UserId,
        trip_id: TripId,
        post_id: Option<PostId>,
    ) -> AppResult<Option<EntNotification>> {
        let (trip, sender) = self.resolve(sender_id, trip_id).await?;
        self.create_notification(NewNotification {
            recipient_id: trip.owner_id,
            sender_id,
            kind: NotificationKind::Like,
            trip_id,
            post_id,
            message: format!("{} liked your trip \"{}\"", sender.name, trip.name),
            metadata: json!({ "tripName": trip.name }),
        })
        .await
    }

    pub async fn create_comment_notification(
        &self,
        sender_id: UserId,
        trip_id: TripId,
        post_id: PostId,
        comment_text: &str,
    ) -> AppResult<Option<EntNotification>> {
        let (trip, sender) = self.resolve(sender_id, trip_id).await?;
        let quoted = excerpt(comment_text, COMMENT_EXCERPT_CHARS);
        self.create_notification(NewNotification {
            recipient_id: trip.owner_id,
            sender_id,
            kind: NotificationKind::Comment,
            trip_id,
            post_id: Some(post_id),
            message: format!(
                "{} commented on your trip \"{}\": \"{}\"",
                sender.name, trip.name, quoted
            ),
            metadata: json!({
                "tripName": trip.name,
                "commentLength": comment_text.chars().count(),
            }),
        })
        .await
    }

    pub async fn create_share_notification(
        &self,
        sender_id: UserId,
        trip_id: TripId,
    ) -> AppResult<Option<EntNotification>> {
        let (trip, sender) = self.resolve(sender_id, trip_id).await?;
        self.create_notification(NewNotification {
            recipient_id: trip.owner_id,
            sender_id,
            kind: NotificationKind::Share,
            trip_id,
            post_id: None,
            message: format!("{} shared your trip \"{}\"", sender.name, trip.name),
            metadata: json!({ "tripName": trip.name }),
        })
        .await
    }

    pub async fn create_clone_notification(
        &self,
        sender_id: UserId,
        trip_id: TripId,
        post_id: PostId,
    ) -> AppResult<Option<EntNotification>> {
        let (trip, sender) = self.resolve(sender_id, trip_id).await?;
        self.create_notification(NewNotification {
            recipient_id: trip.owner_id,
            sender_id,
            kind: NotificationKind::Clone,
            trip_id,
            post_id: Some(post_id),
            message: format!("{} cloned your trip \"{}\"", sender.name, trip.name),
            metadata: json!({ "tripName": trip.name }),
        })
        .await
    }

    pub async fn get_user_notifications(&self, user_id: UserId, page: Page) -> AppResult<NotificationPage> {
        let rows = EntNotification::page_for_recipient(&self.db, user_id, page).await?;
        let total = EntNotification::count_for_recipient(&self.db, user_id).await?;
        let unread_count = EntNotification::unread_count(&self.db, user_id).await?;

        Ok(NotificationPage {
            notifications: rows.into_iter().map(NotificationItem::from).collect(),
            pagination: page.info(total),
            unread_count,
        })
    }

    pub async fn unread_count(&self, user_id: UserId) -> AppResult<i64> {
        EntNotification::unread_count(&self.db, user_id).await
    }

    pub async fn mark_as_read(
        &self,
        id: NotificationId,
        user_id: UserId,
    ) -> AppResult<Option<EntNotification>> {
        EntNotification::mark_read(&self.db, id, user_id).await
    }

    /// Returns how many notifications changed from unread to read.
    pub async fn mark_all_as_read(&self, user_id: UserId) -> AppResult<u64> {
        let modified = EntNotification::mark_all_read(&self.db, user_id).await?;
        info!(user = %user_id, modified, "Marked notifications read");
        Ok(modified)
    }

    pub async fn delete_notification(&self, id: NotificationId, user_id: UserId) -> AppResult<bool> {
        EntNotification::delete_for_recipient(&self.db, id, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures;
    use crate::error::AppError;

    async fn setup() -> (SqliteDatabase, NotificationService, EntUser, EntUser, EntTrip) {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let bob = fixtures::user(&db, "Bob").await;
        let trip = fixtures::trip(&db, alice.id, "Portugal").await;
        (db.clone(), NotificationService::new(db), alice, bob, trip)
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 50), "short");
        let exact = "x".repeat(50);
        assert_eq!(excerpt(&exact, 50), exact);
        let long = "é".repeat(80);
        let cut = excerpt(&long, 50);
        assert_eq!(cut.chars().count(), 53);
        assert!(cut.ends_with("..."));
    }

    #[tokio::test]
    async fn test_self_action_creates_nothing() {
        let (_db, service, alice, _bob, trip) = setup().await;

        let created = service.create_like_notification(alice.id, trip.id, None).await.unwrap();
        assert!(created.is_none());
        let shared = service.create_share_notification(alice.id, trip.id).await.unwrap();
        assert!(shared.is_none());

        let page = service.get_user_notifications(alice.id, Page::new(1, 10)).await.unwrap();
        assert_eq!(page.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_like_notification_addressed_to_owner() {
        let (_db, service, alice, bob, trip) = setup().await;

        let n = service
            .create_like_notification(bob.id, trip.id, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n.recipient_id, alice.id);
        assert_eq!(n.sender_id, bob.id);
        assert_eq!(n.kind, NotificationKind::Like);
        assert!(!n.is_read);
        assert_eq!(n.message, "Bob liked your trip \"Portugal\"");
    }

    #[tokio::test]
    async fn test_comment_message_truncates_long_text() {
        let (db, service, _alice, bob, trip) = setup().await;
        let post = crate::entities::EntCommunityPost::create(
            &db,
            &crate::entities::ent_community_post::NewPost {
                author_id: trip.owner_id,
                trip_id: trip.id,
                title: "Lisbon".into(),
                description: String::new(),
                cover_image: None,
                tags: vec![],
                is_public: true,
            },
        )
        .await
        .unwrap();

        let text: String = ('a'..='z').cycle().take(80).collect();
        let n = service
            .create_comment_notification(bob.id, trip.id, post, &text)
            .await
            .unwrap()
            .unwrap();
        let expected = format!("{}...", &text[..50]);
        assert!(n.message.contains(&expected));
        assert!(!n.message.contains(&text));
    }

    #[tokio::test]
    async fn test_missing_trip_or_sender_is_not_found() {
        let (_db, service, _alice, bob, trip) = setup().await;

        let err = service
            .create_like_notification(bob.id, TripId::new(404), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .create_like_notification(UserId::new(404), trip.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_read_state_is_recipient_scoped() {
        let (_db, service, alice, bob, trip) = setup().await;
        let n = service
            .create_share_notification(bob.id, trip.id)
            .await
            .unwrap()
            .unwrap();

        assert!(service.mark_as_read(n.id, bob.id).await.unwrap().is_none());
        assert!(!service.delete_notification(n.id, bob.id).await.unwrap());

        let read = service.mark_as_read(n.id, alice.id).await.unwrap().unwrap();
        assert!(read.is_read);
        assert!(service.delete_notification(n.id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_all_read_counts_only_unread() {
        let (_db, service, alice, bob, trip) = setup().await;
        let mut ids = Vec::new();
        for _ in 0..5 {
            let n = service
                .create_like_notification(bob.id, trip.id, None)
                .await
                .unwrap()
                .unwrap();
            ids.push(n.id);
        }
        service.mark_as_read(ids[0], alice.id).await.unwrap();
        service.mark_as_read(ids[1], alice.id).await.unwrap();

        assert_eq!(service.mark_all_as_read(alice.id).await.unwrap(), 3);
        assert_eq!(service.unread_count(alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_page_is_newest_first_with_expansions() {
        let (_db, service, alice, bob, trip) = setup().await;
        service.create_like_notification(bob.id, trip.id, None).await.unwrap();
        service.create_share_notification(bob.id, trip.id).await.unwrap();
        service.create_like_notification(bob.id, trip.id, None).await.unwrap();

        let page = service.get_user_notifications(alice.id, Page::new(1, 2)).await.unwrap();
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.pages, 2);
        assert_eq!(page.unread_count, 3);
        assert_eq!(page.notifications.len(), 2);
        assert_eq!(page.notifications[0].kind, NotificationKind::Like);
        assert_eq!(page.notifications[1].kind, NotificationKind::Share);
        assert_eq!(page.notifications[0].sender.name, "Bob");
        assert_eq!(page.notifications[0].trip.name, "Portugal");

        let second = service.get_user_notifications(alice.id, Page::new(2, 2)).await.unwrap();
        assert_eq!(second.notifications.len(), 1);
    }
}
