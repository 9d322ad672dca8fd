// AdminService - platform-wide dashboards and moderation

use serde::Serialize;
use tracing::{info, instrument};

use crate::entities::{
    EntCity, EntComment, EntCommunityPost, EntExpense, EntNotification, EntTrip, EntUser, Entity,
    UserRole,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::SqliteDatabase;
use crate::types::{Page, PageInfo, TripId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub users: i64,
    pub trips: i64,
    pub cities: i64,
    pub posts: i64,
    pub comments: i64,
    pub expenses: i64,
    pub notifications: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

#[derive(Clone)]
pub struct AdminService {
    db: SqliteDatabase,
}

impl AdminService {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    pub async fn stats(&self) -> AppResult<PlatformStats> {
        Ok(PlatformStats {
            users: EntUser::count_all(&self.db).await?,
            trips: EntTrip::count_all(&self.db).await?,
            cities: EntCity::count_all(&self.db).await?,
            posts: EntCommunityPost::count_all(&self.db).await?,
            comments: EntComment::count_all(&self.db).await?,
            expenses: EntExpense::count_all(&self.db).await?,
            notifications: EntNotification::count_all(&self.db).await?,
        })
    }

    pub async fn list_users(&self, page: Page) -> AppResult<Listing<EntUser>> {
        let items = EntUser::list(&self.db, page).await?;
        let total = EntUser::count_all(&self.db).await?;
        Ok(Listing {
            items,
            pagination: page.info(total),
        })
    }

    pub async fn list_trips(&self, page: Page) -> AppResult<Listing<EntTrip>> {
        let items = EntTrip::list(&self.db, page).await?;
        let total = EntTrip::count_all(&self.db).await?;
        Ok(Listing {
            items,
            pagination: page.info(total),
        })
    }

    /// An admin cannot demote themselves; that would leave no way back in.
    #[instrument(skip(self))]
    pub async fn set_role(&self, admin_id: UserId, user_id: UserId, role: UserRole) -> AppResult<EntUser> {
        if admin_id == user_id && role != UserRole::Admin {
            return Err(AppError::BadRequest("Admins cannot remove their own admin role".to_string()));
        }
        if !EntUser::set_role(&self.db, user_id, role).await? {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        info!("User {} is now {}", user_id, role.as_str());
        EntUser::gen_enforce(&self.db, user_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_trip(&self, trip_id: TripId) -> AppResult<()> {
        if !EntTrip::delete(&self.db, trip_id).await? {
            return Err(AppError::NotFound(format!("Trip {} not found", trip_id)));
        }
        info!("Trip {} removed by moderation", trip_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures;

    #[tokio::test]
    async fn test_stats_and_moderation() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let bob = fixtures::user(&db, "Bob").await;
        let trip = fixtures::trip(&db, bob.id, "Japan").await;
        let admin = AdminService::new(db);

        let stats = admin.stats().await.unwrap();
        assert_eq!(stats.users, 2);
        assert_eq!(stats.trips, 1);

        let promoted = admin.set_role(alice.id, alice.id, UserRole::Admin).await.unwrap();
        assert_eq!(promoted.role, UserRole::Admin);
        let err = admin.set_role(alice.id, alice.id, UserRole::User).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = admin.set_role(alice.id, UserId::new(99), UserRole::Admin).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        admin.delete_trip(trip.id).await.unwrap();
        let err = admin.delete_trip(trip.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let users = admin.list_users(Page::new(1, 1)).await.unwrap();
        assert_eq!(users.items.len(), 1);
        assert_eq!(users.pagination.pages, 2);
    }
}
