// Entity layer - row types and the queries that own them

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Encode, FromRow, Sqlite, Type};
use std::fmt::Display;

use crate::error::{AppError, AppResult};
use crate::infrastructure::SqliteDatabase;

// Entity trait that all persisted rows implement
#[async_trait]
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + Sized {
    type Id: for<'q> Encode<'q, Sqlite> + Type<Sqlite> + Display + Copy + Send + Sync + 'static;

    const TABLE: &'static str;
    const KEY: &'static str = "id";
    /// Human readable name used in error messages
    const NAME: &'static str;

    // Entity::gen_nullable(id) - None when the row is absent
    async fn gen_nullable(db: &SqliteDatabase, id: Self::Id) -> AppResult<Option<Self>> {
        let sql = format!("SELECT * FROM {} WHERE {} = ?", Self::TABLE, Self::KEY);
        let row = sqlx::query_as::<_, Self>(&sql)
            .bind(id)
            .fetch_optional(db.pool())
            .await?;
        Ok(row)
    }

    // Entity::gen_enforce(id) - errors if not found
    async fn gen_enforce(db: &SqliteDatabase, id: Self::Id) -> AppResult<Self> {
        Self::gen_nullable(db, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", Self::NAME, id)))
    }

    async fn delete(db: &SqliteDatabase, id: Self::Id) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", Self::TABLE, Self::KEY);
        let result = sqlx::query(&sql).bind(id).execute(db.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_all(db: &SqliteDatabase) -> AppResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", Self::TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(db.pool()).await?;
        Ok(count)
    }
}

pub mod ent_activity;
pub mod ent_budget;
pub mod ent_city;
pub mod ent_comment;
pub mod ent_community_post;
pub mod ent_expense;
pub mod ent_itinerary;
pub mod ent_notification;
pub mod ent_shared_trip;
pub mod ent_trip;
pub mod ent_user;

pub use ent_activity::EntActivity;
pub use ent_budget::EntBudget;
pub use ent_city::EntCity;
pub use ent_comment::EntComment;
pub use ent_community_post::{EntCommunityPost, PostStatus};
pub use ent_expense::{EntExpense, ExpenseCategory};
pub use ent_itinerary::EntItineraryEntry;
pub use ent_notification::{EntNotification, NotificationKind};
pub use ent_shared_trip::EntSharedTrip;
pub use ent_trip::{EntTrip, TripStatus};
pub use ent_user::{EntUser, UserRole};

/// Substring pattern for `LIKE ... ESCAPE '\\'` with the wildcards escaped.
/// SQLite folds ASCII case only, so the term is not lowercased here.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.trim().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::UserId;

    pub async fn user(db: &SqliteDatabase, name: &str) -> EntUser {
        let id = EntUser::create(
            db,
            ent_user::NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".to_string(),
                role: UserRole::User,
                email_verified: true,
                verification_token: None,
            },
        )
        .await
        .unwrap();
        EntUser::gen_enforce(db, id).await.unwrap()
    }

    pub async fn trip(db: &SqliteDatabase, owner: UserId, name: &str) -> EntTrip {
        let id = EntTrip::create(
            db.pool(),
            owner,
            &ent_trip::TripFields {
                name: name.to_string(),
                description: format!("{} description", name),
                destination: "Lisbon".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 5, 5).unwrap(),
                travelers: 2,
                budget: 1500.0,
                trip_type: "leisure".to_string(),
                status: TripStatus::Planning,
                cover_image: Some("cover.jpg".to_string()),
            },
        )
        .await
        .unwrap();
        EntTrip::gen_enforce(db, id).await.unwrap()
    }
}
