use axum::{extract::State, http::StatusCode};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::entities::ent_budget::BudgetBreakdown;
use crate::entities::ent_expense::NewExpense;
use crate::entities::{EntBudget, EntExpense, EntSharedTrip, EntTrip};
use crate::error::AppResult;
use crate::infrastructure::middleware::{Require, Verified};
use crate::services::trip_service::{BudgetOverview, ExpenseSummary, SharedTripView, TripInput};
use crate::types::{ExpenseId, TripId};

use super::extract::{Json, Path};

pub async fn list_trips_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
) -> AppResult<Json<Vec<EntTrip>>> {
    Ok(Json(state.trips.list_trips(viewer.user_id()).await?))
}

pub async fn create_trip_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Json(input): Json<TripInput>,
) -> AppResult<(StatusCode, Json<EntTrip>)> {
    let trip = state.trips.create_trip(viewer.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

pub async fn get_trip_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
) -> AppResult<Json<EntTrip>> {
    Ok(Json(state.trips.get_trip(id, viewer.user_id()).await?))
}

pub async fn update_trip_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
    Json(input): Json<TripInput>,
) -> AppResult<Json<EntTrip>> {
    Ok(Json(state.trips.update_trip(id, viewer.user_id(), input).await?))
}

pub async fn delete_trip_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
) -> AppResult<Json<Value>> {
    state.trips.delete_trip(id, viewer.user_id()).await?;
    Ok(Json(json!({ "id": id, "deleted": true })))
}

pub async fn get_budget_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
) -> AppResult<Json<BudgetOverview>> {
    Ok(Json(state.trips.get_budget(id, viewer.user_id()).await?))
}

pub async fn upsert_budget_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
    Json(breakdown): Json<BudgetBreakdown>,
) -> AppResult<Json<EntBudget>> {
    Ok(Json(state.trips.upsert_budget(id, viewer.user_id(), breakdown).await?))
}

pub async fn list_expenses_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
) -> AppResult<Json<Vec<EntExpense>>> {
    Ok(Json(state.trips.list_expenses(id, viewer.user_id()).await?))
}

pub async fn add_expense_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
    Json(new): Json<NewExpense>,
) -> AppResult<(StatusCode, Json<EntExpense>)> {
    let expense = state.trips.add_expense(id, viewer.user_id(), new).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn expense_summary_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
) -> AppResult<Json<ExpenseSummary>> {
    Ok(Json(state.trips.expense_summary(id, viewer.user_id()).await?))
}

pub async fn delete_expense_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<ExpenseId>,
) -> AppResult<Json<Value>> {
    state.trips.delete_expense(id, viewer.user_id()).await?;
    Ok(Json(json!({ "id": id, "deleted": true })))
}

pub async fn share_trip_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
) -> AppResult<Json<EntSharedTrip>> {
    Ok(Json(state.trips.share_trip(id, viewer.user_id()).await?))
}

pub async fn unshare_trip_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<TripId>,
) -> AppResult<Json<Value>> {
    let archived = state.trips.unshare_trip(id, viewer.user_id()).await?;
    Ok(Json(json!({ "tripId": id, "shared": false, "archivedPosts": archived })))
}

pub async fn shared_trip_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<SharedTripView>> {
    Ok(Json(state.trips.shared_view(&slug).await?))
}
