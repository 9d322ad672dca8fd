// ItineraryService - day-by-day schedule of a trip
// Slots are (trip, date, order_index); the schema keeps them unique and
// nothing here renumbers. Deleting an entry leaves a gap.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::access::owned_trip;
use crate::entities::ent_itinerary::{ItineraryEntryView, NewItineraryEntry};
use crate::entities::{EntActivity, EntCity, EntItineraryEntry, Entity};
use crate::error::{AppError, AppResult};
use crate::infrastructure::SqliteDatabase;
use crate::types::{ActivityId, CityId, ItineraryEntryId, TripId, UserId};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub city_id: CityId,
    pub activity_id: Option<ActivityId>,
    pub date: NaiveDate,
    pub order_index: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub date: Option<NaiveDate>,
    pub order_index: Option<i64>,
    pub notes: Option<String>,
}

/// One calendar day of the schedule
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub date: NaiveDate,
    pub entries: Vec<ItineraryEntryView>,
    pub activity_cost: f64,
}

/// Group an already date-ordered list into days.
pub fn group_by_day(entries: Vec<ItineraryEntryView>) -> Vec<ItineraryDay> {
    let mut days: Vec<ItineraryDay> = Vec::new();
    for entry in entries {
        let cost = entry.activity_cost.unwrap_or(0.0);
        match days.last_mut() {
            Some(day) if day.date == entry.date => {
                day.activity_cost += cost;
                day.entries.push(entry);
            }
            _ => days.push(ItineraryDay {
                date: entry.date,
                activity_cost: cost,
                entries: vec![entry],
            }),
        }
    }
    days
}

fn validate_order_index(order_index: i64) -> AppResult<()> {
    if order_index < 0 {
        return Err(AppError::Validation("orderIndex must be zero or greater".to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ItineraryService {
    db: SqliteDatabase,
}

impl ItineraryService {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    pub async fn list(&self, trip_id: TripId, user_id: UserId) -> AppResult<Vec<ItineraryEntryView>> {
        owned_trip(&self.db, trip_id, user_id).await?;
        EntItineraryEntry::list_for_trip(&self.db, trip_id).await
    }

    pub async fn list_by_day(&self, trip_id: TripId, user_id: UserId) -> AppResult<Vec<ItineraryDay>> {
        Ok(group_by_day(self.list(trip_id, user_id).await?))
    }

    #[instrument(skip(self, request), fields(date = %request.date))]
    pub async fn add_entry(
        &self,
        trip_id: TripId,
        user_id: UserId,
        request: AddEntryRequest,
    ) -> AppResult<ItineraryEntryView> {
        let trip = owned_trip(&self.db, trip_id, user_id).await?;

        if !trip.contains_date(request.date) {
            return Err(AppError::Validation(format!(
                "Date {} is outside the trip ({} to {})",
                request.date, trip.start_date, trip.end_date
            )));
        }
        let order_index = request.order_index.unwrap_or(0);
        validate_order_index(order_index)?;

        let city = EntCity::gen_enforce(&self.db, request.city_id).await?;
        if let Some(activity_id) = request.activity_id {
            let activity = EntActivity::gen_enforce(&self.db, activity_id).await?;
            if activity.city_id != city.id {
                return Err(AppError::Validation(format!(
                    "Activity {} is not in {}",
                    activity.name, city.name
                )));
            }
        }

        let id = EntItineraryEntry::create(
            &self.db,
            trip_id,
            &NewItineraryEntry {
                city_id: city.id,
                activity_id: request.activity_id,
                date: request.date,
                order_index,
                notes: request.notes.unwrap_or_default(),
            },
        )
        .await?;
        info!("Added itinerary entry {} to trip {}", id, trip_id);

        self.entry_view(trip_id, id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_entry(
        &self,
        id: ItineraryEntryId,
        user_id: UserId,
        request: UpdateEntryRequest,
    ) -> AppResult<ItineraryEntryView> {
        let entry = EntItineraryEntry::gen_enforce(&self.db, id).await?;
        let trip = owned_trip(&self.db, entry.trip_id, user_id).await?;

        let date = request.date.unwrap_or(entry.date);
        if !trip.contains_date(date) {
            return Err(AppError::Validation(format!(
                "Date {} is outside the trip ({} to {})",
                date, trip.start_date, trip.end_date
            )));
        }
        let order_index = request.order_index.unwrap_or(entry.order_index);
        validate_order_index(order_index)?;
        let notes = request.notes.unwrap_or(entry.notes);

        EntItineraryEntry::update_slot(&self.db, id, date, order_index, &notes).await?;
        self.entry_view(trip.id, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_entry(&self, id: ItineraryEntryId, user_id: UserId) -> AppResult<()> {
        let entry = EntItineraryEntry::gen_enforce(&self.db, id).await?;
        owned_trip(&self.db, entry.trip_id, user_id).await?;
        EntItineraryEntry::delete(&self.db, id).await?;
        info!("Deleted itinerary entry {}", id);
        Ok(())
    }

    async fn entry_view(&self, trip_id: TripId, id: ItineraryEntryId) -> AppResult<ItineraryEntryView> {
        EntItineraryEntry::list_for_trip(&self.db, trip_id)
            .await?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Itinerary entry {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ent_activity::NewActivity;
    use crate::entities::ent_city::NewCity;
    use crate::entities::fixtures;
    use crate::entities::{EntTrip, EntUser};

    struct Scene {
        service: ItineraryService,
        alice: EntUser,
        bob: EntUser,
        trip: EntTrip,
        lisbon: CityId,
        tram: ActivityId,
        porto: CityId,
    }

    async fn scene() -> Scene {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let bob = fixtures::user(&db, "Bob").await;
        let trip = fixtures::trip(&db, alice.id, "Portugal").await;
        let city = |name: &str| NewCity {
            name: name.to_string(),
            country: "Portugal".to_string(),
            cost_index: 1.0,
            popularity: 5.0,
        };
        let lisbon = EntCity::create(&db, &city("Lisbon")).await.unwrap();
        let porto = EntCity::create(&db, &city("Porto")).await.unwrap();
        let tram = EntActivity::create(
            &db,
            lisbon,
            &NewActivity {
                name: "Tram 28".to_string(),
                activity_type: "sightseeing".to_string(),
                cost: 3.0,
                duration_hours: 1.0,
                description: String::new(),
            },
        )
        .await
        .unwrap();
        Scene {
            service: ItineraryService::new(db),
            alice,
            bob,
            trip,
            lisbon,
            tram,
            porto,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn entry(city_id: CityId, date: NaiveDate, order_index: i64) -> AddEntryRequest {
        AddEntryRequest {
            city_id,
            activity_id: None,
            date,
            order_index: Some(order_index),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_slot_conflicts() {
        let s = scene().await;
        s.service.add_entry(s.trip.id, s.alice.id, entry(s.lisbon, day(2), 0)).await.unwrap();

        let err = s
            .service
            .add_entry(s.trip.id, s.alice.id, entry(s.porto, day(2), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(s.service.list(s.trip.id, s.alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_orders_by_date_then_position() {
        let s = scene().await;
        for (d, order) in [(3, 1), (2, 5), (3, 0), (2, 0)] {
            s.service
                .add_entry(s.trip.id, s.alice.id, entry(s.lisbon, day(d), order))
                .await
                .unwrap();
        }

        let slots: Vec<_> = s
            .service
            .list(s.trip.id, s.alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| (e.date, e.order_index))
            .collect();
        assert_eq!(slots, vec![(day(2), 0), (day(2), 5), (day(3), 0), (day(3), 1)]);

        let days = s.service.list_by_day(s.trip.id, s.alice.id).await.unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].entries.len(), 2);
    }

    #[tokio::test]
    async fn test_entry_validation() {
        let s = scene().await;

        let err = s
            .service
            .add_entry(s.trip.id, s.alice.id, entry(s.lisbon, day(9), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = s
            .service
            .add_entry(s.trip.id, s.alice.id, entry(s.lisbon, day(2), -1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = s
            .service
            .add_entry(s.trip.id, s.alice.id, entry(CityId::new(999), day(2), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let mut wrong_city = entry(s.porto, day(2), 0);
        wrong_city.activity_id = Some(s.tram);
        let err = s.service.add_entry(s.trip.id, s.alice.id, wrong_city).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut right_city = entry(s.lisbon, day(2), 0);
        right_city.activity_id = Some(s.tram);
        let view = s.service.add_entry(s.trip.id, s.alice.id, right_city).await.unwrap();
        assert_eq!(view.activity_name.as_deref(), Some("Tram 28"));
        assert_eq!(view.city_name, "Lisbon");
    }

    #[tokio::test]
    async fn test_only_owner_touches_itinerary() {
        let s = scene().await;
        let view = s
            .service
            .add_entry(s.trip.id, s.alice.id, entry(s.lisbon, day(2), 0))
            .await
            .unwrap();

        let err = s.service.list(s.trip.id, s.bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = s.service.delete_entry(view.id, s.bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = s.service.list(TripId::new(999), s.alice.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_respects_uniqueness_and_delete_leaves_gap() {
        let s = scene().await;
        let first = s
            .service
            .add_entry(s.trip.id, s.alice.id, entry(s.lisbon, day(2), 0))
            .await
            .unwrap();
        let second = s
            .service
            .add_entry(s.trip.id, s.alice.id, entry(s.lisbon, day(2), 1))
            .await
            .unwrap();
        let third = s
            .service
            .add_entry(s.trip.id, s.alice.id, entry(s.lisbon, day(2), 2))
            .await
            .unwrap();

        let err = s
            .service
            .update_entry(
                second.id,
                s.alice.id,
                UpdateEntryRequest {
                    order_index: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let moved = s
            .service
            .update_entry(
                second.id,
                s.alice.id,
                UpdateEntryRequest {
                    notes: Some("Sunset".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.notes, "Sunset");
        assert_eq!(moved.order_index, 1);

        s.service.delete_entry(second.id, s.alice.id).await.unwrap();
        let orders: Vec<_> = s
            .service
            .list(s.trip.id, s.alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.order_index)
            .collect();
        assert_eq!(orders, vec![0, 2]);
        assert_eq!(first.order_index, 0);
        assert_eq!(third.order_index, 2);
    }
}
