use axum::{extract::State, http::StatusCode};

use crate::app_state::AppState;
use crate::entities::ent_activity::NewActivity;
use crate::entities::ent_city::NewCity;
use crate::entities::{EntActivity, EntCity};
use crate::error::AppResult;
use crate::infrastructure::middleware::{Admin, Require};
use crate::services::catalog_service::CitySearch;
use crate::types::CityId;

use super::extract::{Json, Path, Query};

pub async fn list_cities_handler(
    State(state): State<AppState>,
    Query(query): Query<CitySearch>,
) -> AppResult<Json<Vec<EntCity>>> {
    Ok(Json(state.catalog.search_cities(&query).await?))
}

pub async fn create_city_handler(
    State(state): State<AppState>,
    _admin: Require<Admin>,
    Json(new): Json<NewCity>,
) -> AppResult<(StatusCode, Json<EntCity>)> {
    let city = state.catalog.create_city(new).await?;
    Ok((StatusCode::CREATED, Json(city)))
}

pub async fn list_activities_handler(
    State(state): State<AppState>,
    Path(id): Path<CityId>,
) -> AppResult<Json<Vec<EntActivity>>> {
    Ok(Json(state.catalog.list_activities(id).await?))
}

pub async fn create_activity_handler(
    State(state): State<AppState>,
    _admin: Require<Admin>,
    Path(id): Path<CityId>,
    Json(new): Json<NewActivity>,
) -> AppResult<(StatusCode, Json<EntActivity>)> {
    let activity = state.catalog.create_activity(id, new).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}
