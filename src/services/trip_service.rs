// TripService - owner-scoped trips, budgets, expenses and public links

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::access::owned_trip;
use crate::entities::ent_budget::BudgetBreakdown;
use crate::entities::ent_expense::{CategoryTotal, NewExpense};
use crate::entities::ent_itinerary::ItineraryEntryView;
use crate::entities::ent_trip::TripFields;
use crate::entities::{
    EntBudget, EntCommunityPost, EntExpense, EntItineraryEntry, EntSharedTrip, EntTrip, Entity,
    TripStatus,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::security::random_token;
use crate::infrastructure::SqliteDatabase;
use crate::types::{ExpenseId, TripId, UserId};

const SLUG_BYTES: usize = 12;

/// Body of trip create and update. On update every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub travelers: Option<i64>,
    pub budget: Option<f64>,
    pub trip_type: Option<String>,
    pub status: Option<TripStatus>,
    pub cover_image: Option<String>,
}

impl TripInput {
    fn apply(self, fields: &mut TripFields) {
        if let Some(name) = self.name {
            fields.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            fields.description = description;
        }
        if let Some(destination) = self.destination {
            fields.destination = destination;
        }
        if let Some(start_date) = self.start_date {
            fields.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            fields.end_date = end_date;
        }
        if let Some(travelers) = self.travelers {
            fields.travelers = travelers;
        }
        if let Some(budget) = self.budget {
            fields.budget = budget;
        }
        if let Some(trip_type) = self.trip_type {
            fields.trip_type = trip_type;
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        if self.cover_image.is_some() {
            fields.cover_image = self.cover_image;
        }
    }
}

fn validate_fields(fields: &TripFields) -> AppResult<()> {
    if fields.name.is_empty() {
        return Err(AppError::Validation("Trip name is required".to_string()));
    }
    if fields.end_date < fields.start_date {
        return Err(AppError::Validation("End date must not be before start date".to_string()));
    }
    if fields.travelers < 1 {
        return Err(AppError::Validation("A trip needs at least one traveler".to_string()));
    }
    if fields.budget < 0.0 {
        return Err(AppError::Validation("Budget cannot be negative".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetOverview {
    pub trip_id: TripId,
    pub planned: f64,
    pub breakdown: Option<EntBudget>,
    pub spent: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub trip_id: TripId,
    pub total: f64,
    pub count: i64,
    pub by_category: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTripView {
    pub slug: String,
    pub trip: EntTrip,
    pub itinerary: Vec<ItineraryEntryView>,
    pub budget: Option<EntBudget>,
}

#[derive(Clone)]
pub struct TripService {
    db: SqliteDatabase,
}

impl TripService {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    pub async fn list_trips(&self, user_id: UserId) -> AppResult<Vec<EntTrip>> {
        EntTrip::list_by_owner(&self.db, user_id).await
    }

    #[instrument(skip(self, input))]
    pub async fn create_trip(&self, user_id: UserId, input: TripInput) -> AppResult<EntTrip> {
        let (Some(start_date), Some(end_date)) = (input.start_date, input.end_date) else {
            return Err(AppError::Validation("Start and end dates are required".to_string()));
        };

        let mut fields = TripFields {
            name: String::new(),
            description: String::new(),
            destination: String::new(),
            start_date,
            end_date,
            travelers: 1,
            budget: 0.0,
            trip_type: "leisure".to_string(),
            status: TripStatus::default(),
            cover_image: None,
        };
        input.apply(&mut fields);
        validate_fields(&fields)?;

        let id = EntTrip::create(self.db.pool(), user_id, &fields).await?;
        info!("User {} created trip {}", user_id, id);
        EntTrip::gen_enforce(&self.db, id).await
    }

    pub async fn get_trip(&self, id: TripId, user_id: UserId) -> AppResult<EntTrip> {
        owned_trip(&self.db, id, user_id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_trip(&self, id: TripId, user_id: UserId, input: TripInput) -> AppResult<EntTrip> {
        let trip = owned_trip(&self.db, id, user_id).await?;
        let mut fields = TripFields::from(&trip);
        input.apply(&mut fields);
        validate_fields(&fields)?;

        EntTrip::update(&self.db, id, &fields).await?;
        EntTrip::gen_enforce(&self.db, id).await
    }

    /// Cascades to itinerary, budget, expenses, shared link, posts and notifications.
    #[instrument(skip(self))]
    pub async fn delete_trip(&self, id: TripId, user_id: UserId) -> AppResult<()> {
        owned_trip(&self.db, id, user_id).await?;
        EntTrip::delete(&self.db, id).await?;
        info!("Trip {} deleted by owner", id);
        Ok(())
    }

    pub async fn get_budget(&self, id: TripId, user_id: UserId) -> AppResult<BudgetOverview> {
        let trip = owned_trip(&self.db, id, user_id).await?;
        let breakdown = EntBudget::gen_nullable(&self.db, id).await?;
        let spent: f64 = EntExpense::totals_by_category(&self.db, id)
            .await?
            .iter()
            .map(|t| t.total)
            .sum();

        let planned = breakdown.as_ref().map(|b| b.total).unwrap_or(trip.budget);
        Ok(BudgetOverview {
            trip_id: id,
            planned,
            breakdown,
            spent,
            remaining: planned - spent,
        })
    }

    pub async fn upsert_budget(
        &self,
        id: TripId,
        user_id: UserId,
        breakdown: BudgetBreakdown,
    ) -> AppResult<EntBudget> {
        let trip = owned_trip(&self.db, id, user_id).await?;
        let parts = [
            breakdown.transport,
            breakdown.accommodation,
            breakdown.activities,
            breakdown.meals,
        ];
        if parts.iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(AppError::Validation("Budget amounts must be zero or greater".to_string()));
        }
        EntBudget::upsert(&self.db, id, &breakdown, trip.day_count()).await
    }

    #[instrument(skip(self, new))]
    pub async fn add_expense(&self, id: TripId, user_id: UserId, new: NewExpense) -> AppResult<EntExpense> {
        owned_trip(&self.db, id, user_id).await?;
        if new.amount <= 0.0 || !new.amount.is_finite() {
            return Err(AppError::Validation("Expense amount must be greater than zero".to_string()));
        }
        let expense_id = EntExpense::create(&self.db, id, &new).await?;
        EntExpense::gen_enforce(&self.db, expense_id).await
    }

    pub async fn list_expenses(&self, id: TripId, user_id: UserId) -> AppResult<Vec<EntExpense>> {
        owned_trip(&self.db, id, user_id).await?;
        EntExpense::list_for_trip(&self.db, id).await
    }

    pub async fn delete_expense(&self, id: ExpenseId, user_id: UserId) -> AppResult<()> {
        let expense = EntExpense::gen_enforce(&self.db, id).await?;
        owned_trip(&self.db, expense.trip_id, user_id).await?;
        EntExpense::delete(&self.db, id).await?;
        Ok(())
    }

    pub async fn expense_summary(&self, id: TripId, user_id: UserId) -> AppResult<ExpenseSummary> {
        owned_trip(&self.db, id, user_id).await?;
        let by_category = EntExpense::totals_by_category(&self.db, id).await?;
        Ok(ExpenseSummary {
            trip_id: id,
            total: by_category.iter().map(|t| t.total).sum(),
            count: by_category.iter().map(|t| t.count).sum(),
            by_category,
        })
    }

    /// Idempotent: sharing an already shared trip returns the existing slug.
    #[instrument(skip(self))]
    pub async fn share_trip(&self, id: TripId, user_id: UserId) -> AppResult<EntSharedTrip> {
        owned_trip(&self.db, id, user_id).await?;
        EntSharedTrip::get_or_create(&self.db, id, &random_token(SLUG_BYTES)).await
    }

    /// Revokes the public link and archives the trip's community posts.
    #[instrument(skip(self))]
    pub async fn unshare_trip(&self, id: TripId, user_id: UserId) -> AppResult<u64> {
        owned_trip(&self.db, id, user_id).await?;
        EntSharedTrip::delete(&self.db, id).await?;
        let archived = EntCommunityPost::archive_for_trip(&self.db, id).await?;
        info!("Trip {} unshared, {} posts archived", id, archived);
        Ok(archived)
    }

    pub async fn shared_view(&self, slug: &str) -> AppResult<SharedTripView> {
        let shared = EntSharedTrip::find_by_slug(&self.db, slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Shared trip not found".to_string()))?;
        let trip = EntTrip::gen_enforce(&self.db, shared.trip_id).await?;
        let itinerary = EntItineraryEntry::list_for_trip(&self.db, trip.id).await?;
        let budget = EntBudget::gen_nullable(&self.db, trip.id).await?;

        Ok(SharedTripView {
            slug: shared.slug,
            trip,
            itinerary,
            budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ent_community_post::NewPost;
    use crate::entities::fixtures;
    use crate::entities::{ExpenseCategory, PostStatus};

    fn input(name: &str, start: u32, end: u32) -> TripInput {
        TripInput {
            name: Some(name.to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 6, start),
            end_date: NaiveDate::from_ymd_opt(2026, 6, end),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_trip_validation() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let service = TripService::new(db);

        let trip = service.create_trip(alice.id, input("Rome", 1, 4)).await.unwrap();
        assert_eq!(trip.status, TripStatus::Planning);
        assert_eq!(trip.travelers, 1);
        assert_eq!(trip.trip_type, "leisure");

        let err = service.create_trip(alice.id, input("Rome", 4, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = service.create_trip(alice.id, input("  ", 1, 4)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let mut no_dates = input("Rome", 1, 4);
        no_dates.end_date = None;
        let err = service.create_trip(alice.id, no_dates).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_is_partial_and_owner_only() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let bob = fixtures::user(&db, "Bob").await;
        let trip = fixtures::trip(&db, alice.id, "Portugal").await;
        let service = TripService::new(db);

        let patch = TripInput {
            travelers: Some(4),
            ..Default::default()
        };
        let err = service.update_trip(trip.id, bob.id, patch.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = service.update_trip(trip.id, alice.id, patch).await.unwrap();
        assert_eq!(updated.travelers, 4);
        assert_eq!(updated.name, "Portugal");
    }

    #[tokio::test]
    async fn test_budget_and_expenses() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let trip = fixtures::trip(&db, alice.id, "Portugal").await;
        let service = TripService::new(db);

        let overview = service.get_budget(trip.id, alice.id).await.unwrap();
        assert!(overview.breakdown.is_none());
        assert_eq!(overview.planned, 1500.0);

        let budget = service
            .upsert_budget(
                trip.id,
                alice.id,
                BudgetBreakdown {
                    transport: 300.0,
                    accommodation: 500.0,
                    activities: 100.0,
                    meals: 100.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(budget.total, 1000.0);
        assert_eq!(budget.daily_average, 200.0);

        let expense = |amount| NewExpense {
            category: ExpenseCategory::Food,
            amount,
            date: trip.start_date,
            description: "Pastéis".into(),
            location: String::new(),
            notes: String::new(),
        };
        let err = service.add_expense(trip.id, alice.id, expense(0.0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let spent = service.add_expense(trip.id, alice.id, expense(40.0)).await.unwrap();
        service.add_expense(trip.id, alice.id, expense(10.0)).await.unwrap();

        let summary = service.expense_summary(trip.id, alice.id).await.unwrap();
        assert_eq!(summary.total, 50.0);
        assert_eq!(summary.count, 2);

        let overview = service.get_budget(trip.id, alice.id).await.unwrap();
        assert_eq!(overview.remaining, 950.0);

        service.delete_expense(spent.id, alice.id).await.unwrap();
        assert_eq!(service.list_expenses(trip.id, alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_share_then_unshare_archives_posts() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let trip = fixtures::trip(&db, alice.id, "Portugal").await;
        let post = EntCommunityPost::create(
            &db,
            &NewPost {
                author_id: alice.id,
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
        let service = TripService::new(db.clone());

        let shared = service.share_trip(trip.id, alice.id).await.unwrap();
        assert_eq!(service.share_trip(trip.id, alice.id).await.unwrap().slug, shared.slug);

        let view = service.shared_view(&shared.slug).await.unwrap();
        assert_eq!(view.trip.id, trip.id);
        assert!(view.itinerary.is_empty());

        assert_eq!(service.unshare_trip(trip.id, alice.id).await.unwrap(), 1);
        let err = service.shared_view(&shared.slug).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let stored = EntCommunityPost::gen_enforce(&db, post).await.unwrap();
        assert_eq!(stored.status, PostStatus::Archived);
    }
}
