use axum::{extract::State, http::StatusCode};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::entities::ent_itinerary::ItineraryEntryView;
use crate::error::AppResult;
use crate::infrastructure::middleware::{Require, Verified};
use crate::services::itinerary_service::{AddEntryRequest, ItineraryDay, UpdateEntryRequest};
use crate::types::{ItineraryEntryId, TripId};

use super::extract::{Json, Path};

pub async fn list_entries_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(trip_id): Path<TripId>,
) -> AppResult<Json<Vec<ItineraryEntryView>>> {
    Ok(Json(state.itinerary.list(trip_id, viewer.user_id()).await?))
}

pub async fn list_days_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(trip_id): Path<TripId>,
) -> AppResult<Json<Vec<ItineraryDay>>> {
    Ok(Json(state.itinerary.list_by_day(trip_id, viewer.user_id()).await?))
}

pub async fn add_entry_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(trip_id): Path<TripId>,
    Json(req): Json<AddEntryRequest>,
) -> AppResult<(StatusCode, Json<ItineraryEntryView>)> {
    let entry = state.itinerary.add_entry(trip_id, viewer.user_id(), req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<ItineraryEntryId>,
    Json(req): Json<UpdateEntryRequest>,
) -> AppResult<Json<ItineraryEntryView>> {
    Ok(Json(state.itinerary.update_entry(id, viewer.user_id(), req).await?))
}

pub async fn delete_entry_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<ItineraryEntryId>,
) -> AppResult<Json<Value>> {
    state.itinerary.delete_entry(id, viewer.user_id()).await?;
    Ok(Json(json!({ "id": id, "deleted": true })))
}
