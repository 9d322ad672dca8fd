use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::entities::{EntTrip, EntUser, UserRole};
use crate::error::AppResult;
use crate::infrastructure::middleware::{Admin, Require};
use crate::services::admin_service::{Listing, PlatformStats};
use crate::types::{TripId, UserId};

use super::extract::{Json, Path, Query};
use super::PageParams;

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: UserRole,
}

pub async fn stats_handler(
    State(state): State<AppState>,
    _admin: Require<Admin>,
) -> AppResult<Json<PlatformStats>> {
    Ok(Json(state.admin.stats().await?))
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    _admin: Require<Admin>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Listing<EntUser>>> {
    let page = params.resolve(&state)?;
    Ok(Json(state.admin.list_users(page).await?))
}

pub async fn list_trips_handler(
    State(state): State<AppState>,
    _admin: Require<Admin>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Listing<EntTrip>>> {
    let page = params.resolve(&state)?;
    Ok(Json(state.admin.list_trips(page).await?))
}

pub async fn set_role_handler(
    State(state): State<AppState>,
    admin: Require<Admin>,
    Path(id): Path<UserId>,
    Json(change): Json<RoleChange>,
) -> AppResult<Json<EntUser>> {
    Ok(Json(state.admin.set_role(admin.user_id(), id, change.role).await?))
}

pub async fn delete_trip_handler(
    State(state): State<AppState>,
    _admin: Require<Admin>,
    Path(id): Path<TripId>,
) -> AppResult<Json<Value>> {
    state.admin.delete_trip(id).await?;
    Ok(Json(json!({ "id": id, "deleted": true })))
}
