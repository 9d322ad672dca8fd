// CatalogService - cities and activities that itineraries are built from

use serde::Deserialize;
use tracing::info;

use crate::entities::ent_activity::NewActivity;
use crate::entities::ent_city::NewCity;
use crate::entities::{EntActivity, EntCity, Entity};
use crate::error::{AppError, AppResult};
use crate::infrastructure::SqliteDatabase;
use crate::types::CityId;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CitySearch {
    pub search: Option<String>,
    pub country: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct CatalogService {
    db: SqliteDatabase,
    max_limit: i64,
}

impl CatalogService {
    pub fn new(db: SqliteDatabase, max_limit: i64) -> Self {
        Self {
            db,
            max_limit: max_limit.max(1),
        }
    }

    pub async fn search_cities(&self, query: &CitySearch) -> AppResult<Vec<EntCity>> {
        let limit = query.limit.unwrap_or(self.max_limit).clamp(1, self.max_limit);
        EntCity::search(&self.db, query.search.as_deref(), query.country.as_deref(), limit).await
    }

    pub async fn create_city(&self, new: NewCity) -> AppResult<EntCity> {
        if new.name.trim().is_empty() || new.country.trim().is_empty() {
            return Err(AppError::Validation("City name and country are required".to_string()));
        }
        let id = EntCity::create(&self.db, &new).await?;
        info!("Added city {} ({})", new.name.trim(), id);
        EntCity::gen_enforce(&self.db, id).await
    }

    pub async fn list_activities(&self, city_id: CityId) -> AppResult<Vec<EntActivity>> {
        EntCity::gen_enforce(&self.db, city_id).await?;
        EntActivity::list_by_city(&self.db, city_id).await
    }

    pub async fn create_activity(&self, city_id: CityId, new: NewActivity) -> AppResult<EntActivity> {
        EntCity::gen_enforce(&self.db, city_id).await?;
        if new.name.trim().is_empty() {
            return Err(AppError::Validation("Activity name is required".to_string()));
        }
        if new.cost < 0.0 || new.duration_hours < 0.0 {
            return Err(AppError::Validation("Cost and duration cannot be negative".to_string()));
        }
        let id = EntActivity::create(&self.db, city_id, &new).await?;
        EntActivity::gen_enforce(&self.db, id).await
    }
}
