// EntBudget - one planned cost breakdown per trip

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::error::AppResult;
use crate::infrastructure::SqliteDatabase;
use crate::types::TripId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntBudget {
    pub trip_id: TripId,
    pub transport: f64,
    pub accommodation: f64,
    pub activities: f64,
    pub meals: f64,
    pub total: f64,
    pub daily_average: f64,
    pub updated_at: DateTime<Utc>,
}

impl Entity for EntBudget {
    type Id = TripId;
    const TABLE: &'static str = "budgets";
    const KEY: &'static str = "trip_id";
    const NAME: &'static str = "Budget";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetBreakdown {
    #[serde(default)]
    pub transport: f64,
    #[serde(default)]
    pub accommodation: f64,
    #[serde(default)]
    pub activities: f64,
    #[serde(default)]
    pub meals: f64,
}

impl BudgetBreakdown {
    pub fn total(&self) -> f64 {
        self.transport + self.accommodation + self.activities + self.meals
    }

    pub fn daily_average(&self, days: i64) -> f64 {
        if days <= 0 {
            return self.total();
        }
        self.total() / days as f64
    }
}

impl EntBudget {
    /// Insert or replace the trip's budget; totals are derived from the breakdown.
    pub async fn upsert(
        db: &SqliteDatabase,
        trip_id: TripId,
        breakdown: &BudgetBreakdown,
        days: i64,
    ) -> AppResult<Self> {
        let budget = sqlx::query_as::<_, Self>(
            "INSERT INTO budgets (trip_id, transport, accommodation, activities, meals, total, daily_average, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (trip_id) DO UPDATE SET
                transport = excluded.transport,
                accommodation = excluded.accommodation,
                activities = excluded.activities,
                meals = excluded.meals,
                total = excluded.total,
                daily_average = excluded.daily_average,
                updated_at = excluded.updated_at
             RETURNING *",
        )
        .bind(trip_id)
        .bind(breakdown.transport)
        .bind(breakdown.accommodation)
        .bind(breakdown.activities)
        .bind(breakdown.meals)
        .bind(breakdown.total())
        .bind(breakdown.daily_average(days))
        .bind(Utc::now())
        .fetch_one(db.pool())
        .await?;
        Ok(budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures;

    #[tokio::test]
    async fn test_upsert_replaces_existing_budget() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let trip = fixtures::trip(&db, alice.id, "Portugal").await;

        let first = BudgetBreakdown {
            transport: 100.0,
            accommodation: 200.0,
            activities: 50.0,
            meals: 150.0,
        };
        let budget = EntBudget::upsert(&db, trip.id, &first, trip.day_count()).await.unwrap();
        assert_eq!(budget.total, 500.0);
        assert_eq!(budget.daily_average, 100.0);

        let second = BudgetBreakdown {
            transport: 0.0,
            ..first
        };
        let budget = EntBudget::upsert(&db, trip.id, &second, trip.day_count()).await.unwrap();
        assert_eq!(budget.total, 400.0);
        assert_eq!(EntBudget::count_all(&db).await.unwrap(), 1);
    }
}
