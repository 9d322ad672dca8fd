// EntCity - reference data, unique per (name, country)

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use super::{like_pattern, Entity};
use crate::error::{AppError, AppResult};
use crate::infrastructure::SqliteDatabase;
use crate::types::CityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntCity {
    pub id: CityId,
    pub name: String,
    pub country: String,
    pub cost_index: f64,
    pub popularity: f64,
}

impl Entity for EntCity {
    type Id = CityId;
    const TABLE: &'static str = "cities";
    const NAME: &'static str = "City";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCity {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub cost_index: f64,
    #[serde(default)]
    pub popularity: f64,
}

impl EntCity {
    pub async fn create(db: &SqliteDatabase, new: &NewCity) -> AppResult<CityId> {
        let result = sqlx::query(
            "INSERT INTO cities (name, country, cost_index, popularity) VALUES (?, ?, ?, ?)",
        )
        .bind(new.name.trim())
        .bind(new.country.trim())
        .bind(new.cost_index)
        .bind(new.popularity)
        .execute(db.pool())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "City {}, {} already exists",
                new.name.trim(),
                new.country.trim()
            )),
            other => other,
        })?;
        Ok(CityId::new(result.last_insert_rowid()))
    }

    /// Most popular first; `search` matches the city or country name.
    pub async fn search(
        db: &SqliteDatabase,
        search: Option<&str>,
        country: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<Self>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM cities WHERE 1 = 1");
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = like_pattern(term);
            qb.push(" AND (name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR country LIKE ");
            qb.push_bind(pattern);
            qb.push(" ESCAPE '\\')");
        }
        if let Some(country) = country.map(str::trim).filter(|c| !c.is_empty()) {
            qb.push(" AND country = ");
            qb.push_bind(country.to_string());
        }
        qb.push(" ORDER BY popularity DESC, name ASC LIMIT ");
        qb.push_bind(limit);

        let cities = qb.build_query_as::<Self>().fetch_all(db.pool()).await?;
        Ok(cities)
    }
}
