// EntActivity - things to do in a city

use serde::{Deserialize, Serialize};

use super::Entity;
use crate::error::AppResult;
use crate::infrastructure::SqliteDatabase;
use crate::types::{ActivityId, CityId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntActivity {
    pub id: ActivityId,
    pub city_id: CityId,
    pub name: String,
    pub activity_type: String,
    pub cost: f64,
    pub duration_hours: f64,
    pub description: String,
}

impl Entity for EntActivity {
    type Id = ActivityId;
    const TABLE: &'static str = "activities";
    const NAME: &'static str = "Activity";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub name: String,
    #[serde(default = "default_activity_type")]
    pub activity_type: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default = "default_duration")]
    pub duration_hours: f64,
    #[serde(default)]
    pub description: String,
}

fn default_activity_type() -> String {
    "sightseeing".to_string()
}

fn default_duration() -> f64 {
    1.0
}

impl EntActivity {
    pub async fn create(db: &SqliteDatabase, city_id: CityId, new: &NewActivity) -> AppResult<ActivityId> {
        let result = sqlx::query(
            "INSERT INTO activities (city_id, name, activity_type, cost, duration_hours, description)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(city_id)
        .bind(new.name.trim())
        .bind(&new.activity_type)
        .bind(new.cost)
        .bind(new.duration_hours)
        .bind(&new.description)
        .execute(db.pool())
        .await?;
        Ok(ActivityId::new(result.last_insert_rowid()))
    }

    pub async fn list_by_city(db: &SqliteDatabase, city_id: CityId) -> AppResult<Vec<Self>> {
        let activities = sqlx::query_as::<_, Self>(
            "SELECT * FROM activities WHERE city_id = ? ORDER BY name ASC",
        )
        .bind(city_id)
        .fetch_all(db.pool())
        .await?;
        Ok(activities)
    }
}
