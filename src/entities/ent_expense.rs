// EntExpense - money actually spent on a trip

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::error::AppResult;
use crate::infrastructure::SqliteDatabase;
use crate::types::{ExpenseId, TripId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Transport,
    Accommodation,
    Food,
    Activities,
    Shopping,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntExpense {
    pub id: ExpenseId,
    pub trip_id: TripId,
    pub category: ExpenseCategory,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub location: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for EntExpense {
    type Id = ExpenseId;
    const TABLE: &'static str = "expenses";
    const NAME: &'static str = "Expense";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub category: ExpenseCategory,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: f64,
    pub count: i64,
}

impl EntExpense {
    pub async fn create(db: &SqliteDatabase, trip_id: TripId, new: &NewExpense) -> AppResult<ExpenseId> {
        let result = sqlx::query(
            "INSERT INTO expenses (trip_id, category, amount, date, description, location, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(trip_id)
        .bind(new.category)
        .bind(new.amount)
        .bind(new.date)
        .bind(&new.description)
        .bind(&new.location)
        .bind(&new.notes)
        .bind(Utc::now())
        .execute(db.pool())
        .await?;
        Ok(ExpenseId::new(result.last_insert_rowid()))
    }

    pub async fn list_for_trip(db: &SqliteDatabase, trip_id: TripId) -> AppResult<Vec<Self>> {
        let expenses = sqlx::query_as::<_, Self>(
            "SELECT * FROM expenses WHERE trip_id = ? ORDER BY date DESC, id DESC",
        )
        .bind(trip_id)
        .fetch_all(db.pool())
        .await?;
        Ok(expenses)
    }

    pub async fn totals_by_category(db: &SqliteDatabase, trip_id: TripId) -> AppResult<Vec<CategoryTotal>> {
        let totals = sqlx::query_as::<_, CategoryTotal>(
            "SELECT category, SUM(amount) AS total, COUNT(*) AS count
             FROM expenses WHERE trip_id = ?
             GROUP BY category ORDER BY total DESC",
        )
        .bind(trip_id)
        .fetch_all(db.pool())
        .await?;
        Ok(totals)
    }
}
