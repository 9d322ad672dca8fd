// EntTrip - the root of every user-owned resource

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite};

use super::Entity;
use crate::error::AppResult;
use crate::infrastructure::SqliteDatabase;
use crate::types::{Page, TripId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TripStatus {
    Planning,
    Ongoing,
    Completed,
}

impl Default for TripStatus {
    fn default() -> Self {
        TripStatus::Planning
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntTrip {
    pub id: TripId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travelers: i64,
    pub budget: f64,
    pub trip_type: String,
    pub status: TripStatus,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for EntTrip {
    type Id = TripId;
    const TABLE: &'static str = "trips";
    const NAME: &'static str = "Trip";
}

/// Trip summary embedded in posts and notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: TripId,
    pub name: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cover_image: Option<String>,
}

/// Writable columns of a trip
#[derive(Debug, Clone)]
pub struct TripFields {
    pub name: String,
    pub description: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travelers: i64,
    pub budget: f64,
    pub trip_type: String,
    pub status: TripStatus,
    pub cover_image: Option<String>,
}

impl From<&EntTrip> for TripFields {
    fn from(trip: &EntTrip) -> Self {
        Self {
            name: trip.name.clone(),
            description: trip.description.clone(),
            destination: trip.destination.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            travelers: trip.travelers,
            budget: trip.budget,
            trip_type: trip.trip_type.clone(),
            status: trip.status,
            cover_image: trip.cover_image.clone(),
        }
    }
}

impl EntTrip {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Number of calendar days covered, counting both ends.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Generic over the executor so cloning can create the trip inside its transaction.
    pub async fn create<'e, E>(executor: E, owner_id: UserId, fields: &TripFields) -> AppResult<TripId>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO trips (owner_id, name, description, destination, start_date, end_date,
                                travelers, budget, trip_type, status, cover_image, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.destination)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.travelers)
        .bind(fields.budget)
        .bind(&fields.trip_type)
        .bind(fields.status)
        .bind(&fields.cover_image)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(TripId::new(result.last_insert_rowid()))
    }

    pub async fn update(db: &SqliteDatabase, id: TripId, fields: &TripFields) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE trips SET name = ?, description = ?, destination = ?, start_date = ?, end_date = ?,
                              travelers = ?, budget = ?, trip_type = ?, status = ?, cover_image = ?,
                              updated_at = ?
             WHERE id = ?",
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.destination)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.travelers)
        .bind(fields.budget)
        .bind(&fields.trip_type)
        .bind(fields.status)
        .bind(&fields.cover_image)
        .bind(Utc::now())
        .bind(id)
        .execute(db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_by_owner(db: &SqliteDatabase, owner_id: UserId) -> AppResult<Vec<Self>> {
        let trips = sqlx::query_as::<_, Self>(
            "SELECT * FROM trips WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(db.pool())
        .await?;
        Ok(trips)
    }

    pub async fn list(db: &SqliteDatabase, page: Page) -> AppResult<Vec<Self>> {
        let trips = sqlx::query_as::<_, Self>(
            "SELECT * FROM trips ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(db.pool())
        .await?;
        Ok(trips)
    }

    pub async fn summary(db: &SqliteDatabase, id: TripId) -> AppResult<Option<TripSummary>> {
        let summary = sqlx::query_as::<_, TripSummary>(
            "SELECT id, name, destination, start_date, end_date, cover_image FROM trips WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
        Ok(summary)
    }
}
