// EntItineraryEntry - one activity slot on a trip day

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::error::{AppError, AppResult};
use crate::infrastructure::SqliteDatabase;
use crate::types::{ActivityId, CityId, ItineraryEntryId, TripId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntItineraryEntry {
    pub id: ItineraryEntryId,
    pub trip_id: TripId,
    pub city_id: CityId,
    pub activity_id: Option<ActivityId>,
    pub date: NaiveDate,
    pub order_index: i64,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for EntItineraryEntry {
    type Id = ItineraryEntryId;
    const TABLE: &'static str = "itinerary_entries";
    const NAME: &'static str = "Itinerary entry";
}

/// Entry joined with its city and activity names, as the schedule view renders it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryEntryView {
    pub id: ItineraryEntryId,
    pub trip_id: TripId,
    pub city_id: CityId,
    pub city_name: String,
    pub country: String,
    pub activity_id: Option<ActivityId>,
    pub activity_name: Option<String>,
    pub activity_cost: Option<f64>,
    pub date: NaiveDate,
    pub order_index: i64,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct NewItineraryEntry {
    pub city_id: CityId,
    pub activity_id: Option<ActivityId>,
    pub date: NaiveDate,
    pub order_index: i64,
    pub notes: String,
}

fn slot_taken() -> AppError {
    AppError::Conflict("An itinerary entry already occupies this date and position".to_string())
}

impl EntItineraryEntry {
    /// Fails with `Conflict` when (trip, date, order_index) is already occupied.
    pub async fn create(
        db: &SqliteDatabase,
        trip_id: TripId,
        new: &NewItineraryEntry,
    ) -> AppResult<ItineraryEntryId> {
        let result = sqlx::query(
            "INSERT INTO itinerary_entries (trip_id, city_id, activity_id, date, order_index, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(trip_id)
        .bind(new.city_id)
        .bind(new.activity_id)
        .bind(new.date)
        .bind(new.order_index)
        .bind(&new.notes)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => slot_taken(),
            other => other,
        })?;
        Ok(ItineraryEntryId::new(result.last_insert_rowid()))
    }

    pub async fn update_slot(
        db: &SqliteDatabase,
        id: ItineraryEntryId,
        date: NaiveDate,
        order_index: i64,
        notes: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE itinerary_entries SET date = ?, order_index = ?, notes = ? WHERE id = ?",
        )
        .bind(date)
        .bind(order_index)
        .bind(notes)
        .bind(id)
        .execute(db.pool())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => slot_taken(),
            other => other,
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Date ascending, then position ascending.
    pub async fn list_for_trip(db: &SqliteDatabase, trip_id: TripId) -> AppResult<Vec<ItineraryEntryView>> {
        let entries = sqlx::query_as::<_, ItineraryEntryView>(
            "SELECT e.id, e.trip_id, e.city_id, c.name AS city_name, c.country,
                    e.activity_id, a.name AS activity_name, a.cost AS activity_cost,
                    e.date, e.order_index, e.notes
             FROM itinerary_entries e
             JOIN cities c ON c.id = e.city_id
             LEFT JOIN activities a ON a.id = e.activity_id
             WHERE e.trip_id = ?
             ORDER BY e.date ASC, e.order_index ASC",
        )
        .bind(trip_id)
        .fetch_all(db.pool())
        .await?;
        Ok(entries)
    }
}
