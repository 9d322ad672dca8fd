use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::entities::EntUser;
use crate::error::AppResult;
use crate::infrastructure::middleware::Require;
use crate::services::account_service::{AuthResponse, LoginRequest, SignupRequest};

use super::extract::Json;

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

pub async fn signup_handler(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let user = state.accounts.signup(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account created. Check your email to verify your address.",
            "user": user,
        })),
    ))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(state.accounts.login(req).await?))
}

pub async fn verify_email_handler(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> AppResult<Json<Value>> {
    let user = state.accounts.verify_email(&req.token).await?;
    Ok(Json(json!({ "message": "Email verified", "user": user })))
}

pub async fn me_handler(State(state): State<AppState>, viewer: Require) -> AppResult<Json<EntUser>> {
    Ok(Json(state.accounts.me(viewer.user_id()).await?))
}
