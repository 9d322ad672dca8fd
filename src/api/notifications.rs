use axum::extract::State;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::entities::EntNotification;
use crate::error::{AppError, AppResult};
use crate::infrastructure::middleware::Require;
use crate::services::notification_service::NotificationPage;
use crate::types::NotificationId;

use super::extract::{Json, Path, Query};
use super::PageParams;

pub async fn list_handler(
    State(state): State<AppState>,
    viewer: Require,
    Query(params): Query<PageParams>,
) -> AppResult<Json<NotificationPage>> {
    let page = params.resolve(&state)?;
    Ok(Json(state.notifications.get_user_notifications(viewer.user_id(), page).await?))
}

pub async fn unread_count_handler(
    State(state): State<AppState>,
    viewer: Require,
) -> AppResult<Json<Value>> {
    let count = state.notifications.unread_count(viewer.user_id()).await?;
    Ok(Json(json!({ "unreadCount": count })))
}

pub async fn mark_read_handler(
    State(state): State<AppState>,
    viewer: Require,
    Path(id): Path<NotificationId>,
) -> AppResult<Json<EntNotification>> {
    state
        .notifications
        .mark_as_read(id, viewer.user_id())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
}

pub async fn mark_all_read_handler(
    State(state): State<AppState>,
    viewer: Require,
) -> AppResult<Json<Value>> {
    let modified = state.notifications.mark_all_as_read(viewer.user_id()).await?;
    Ok(Json(json!({ "modifiedCount": modified })))
}

pub async fn delete_handler(
    State(state): State<AppState>,
    viewer: Require,
    Path(id): Path<NotificationId>,
) -> AppResult<Json<Value>> {
    if !state.notifications.delete_notification(id, viewer.user_id()).await? {
        return Err(AppError::NotFound(format!("Notification {} not found", id)));
    }
    Ok(Json(json!({ "id": id, "deleted": true })))
}
