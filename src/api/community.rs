use axum::{body::Bytes, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::entities::ent_comment::CommentView;
use crate::entities::ent_community_post::{FeedSort, PostView};
use crate::entities::EntTrip;
use crate::error::{AppError, AppResult};
use crate::infrastructure::middleware::{OptionalViewer, Require, Verified};
use crate::services::community_service::{
    ClonePostRequest, CommentRequest, CreatePostRequest, FeedPage, FeedRequest, LikeToggle,
    PostDetail, ShareResult,
};
use crate::types::PostId;

use super::extract::{Json, Path, Query};
use super::PageParams;

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

fn parse_sort(sort: Option<&str>) -> AppResult<FeedSort> {
    match sort.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(FeedSort::default()),
        Some(value) => FeedSort::parse(value).ok_or_else(|| {
            AppError::Validation(format!(
                "Unknown sort '{}', expected latest, popular or trending",
                value
            ))
        }),
    }
}

pub async fn list_posts_handler(
    State(state): State<AppState>,
    viewer: OptionalViewer,
    Query(params): Query<FeedParams>,
) -> AppResult<Json<FeedPage>> {
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(&state)?;
    let request = FeedRequest {
        search: params.search,
        sort: parse_sort(params.sort.as_deref())?,
    };
    Ok(Json(state.community.list_posts(&request, page, viewer.user_id()).await?))
}

pub async fn trending_handler(
    State(state): State<AppState>,
    viewer: OptionalViewer,
) -> AppResult<Json<Vec<PostView>>> {
    Ok(Json(state.community.trending(viewer.user_id()).await?))
}

pub async fn my_posts_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
) -> AppResult<Json<Vec<PostView>>> {
    Ok(Json(state.community.my_posts(viewer.user_id()).await?))
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<PostView>)> {
    let post = state.community.create_post(viewer.user_id(), req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    viewer: OptionalViewer,
    Path(id): Path<PostId>,
) -> AppResult<Json<PostDetail>> {
    Ok(Json(state.community.get_post(id, viewer.user_id()).await?))
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<PostId>,
) -> AppResult<Json<Value>> {
    state.community.delete_post(id, viewer.user_id()).await?;
    Ok(Json(json!({ "id": id, "deleted": true })))
}

pub async fn toggle_like_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<PostId>,
) -> AppResult<Json<LikeToggle>> {
    Ok(Json(state.community.toggle_like(id, viewer.user_id()).await?))
}

pub async fn list_comments_handler(
    State(state): State<AppState>,
    viewer: OptionalViewer,
    Path(id): Path<PostId>,
) -> AppResult<Json<Vec<CommentView>>> {
    Ok(Json(state.community.list_comments(id, viewer.user_id()).await?))
}

pub async fn add_comment_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<PostId>,
    Json(req): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<CommentView>)> {
    let comment = state.community.add_comment(id, viewer.user_id(), &req.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// The body is optional; an empty request clones with default naming.
pub async fn clone_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<PostId>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<EntTrip>)> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        ClonePostRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid clone request: {}", e)))?
    };
    let trip = state.community.clone_trip(id, viewer.user_id(), req).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

pub async fn share_handler(
    State(state): State<AppState>,
    viewer: Require<Verified>,
    Path(id): Path<PostId>,
) -> AppResult<Json<ShareResult>> {
    Ok(Json(state.community.share_post(id, viewer.user_id()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort(None).unwrap(), FeedSort::Latest);
        assert_eq!(parse_sort(Some("")).unwrap(), FeedSort::Latest);
        assert_eq!(parse_sort(Some("popular")).unwrap(), FeedSort::Popular);
        assert_eq!(parse_sort(Some("trending")).unwrap(), FeedSort::Trending);
        assert!(matches!(parse_sort(Some("oldest")), Err(AppError::Validation(_))));
    }
}
