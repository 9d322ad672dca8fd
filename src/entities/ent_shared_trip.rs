// EntSharedTrip - public slug for a trip

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::error::AppResult;
use crate::infrastructure::SqliteDatabase;
use crate::types::TripId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntSharedTrip {
    pub trip_id: TripId,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for EntSharedTrip {
    type Id = TripId;
    const TABLE: &'static str = "shared_trips";
    const KEY: &'static str = "trip_id";
    const NAME: &'static str = "Shared trip";
}

impl EntSharedTrip {
    /// Returns the existing link when the trip is already shared, so the slug stays stable.
    pub async fn get_or_create(db: &SqliteDatabase, trip_id: TripId, slug: &str) -> AppResult<Self> {
        sqlx::query(
            "INSERT INTO shared_trips (trip_id, slug, created_at) VALUES (?, ?, ?)
             ON CONFLICT (trip_id) DO NOTHING",
        )
        .bind(trip_id)
        .bind(slug)
        .bind(Utc::now())
        .execute(db.pool())
        .await?;

        Self::gen_enforce(db, trip_id).await
    }

    pub async fn find_by_slug(db: &SqliteDatabase, slug: &str) -> AppResult<Option<Self>> {
        let shared = sqlx::query_as::<_, Self>("SELECT * FROM shared_trips WHERE slug = ?")
            .bind(slug)
            .fetch_optional(db.pool())
            .await?;
        Ok(shared)
    }
}
