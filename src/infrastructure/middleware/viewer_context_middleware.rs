// ViewerContext Middleware - resolves the bearer token into a request-scoped viewer

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::entities::{EntUser, Entity};
use crate::infrastructure::viewer::{Viewer, ViewerContext};

/// What the Authorization header carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BearerToken<'a> {
    Missing,
    Malformed,
    Present(&'a str),
}

/// Never rejects: a bad token yields an `Invalid` viewer and the guards on
/// each route decide whether that matters.
pub async fn viewer_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = format!("req-{}", Uuid::new_v4());
    let viewer_context = resolve_viewer_context(&state, request.headers(), request_id).await;

    request.extensions_mut().insert(Arc::new(viewer_context));
    next.run(request).await
}

pub fn extract_bearer(headers: &HeaderMap) -> BearerToken<'_> {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return BearerToken::Missing;
    };
    let Ok(value) = value.to_str() else {
        return BearerToken::Malformed;
    };
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => BearerToken::Present(token.trim()),
        _ => BearerToken::Malformed,
    }
}

async fn resolve_viewer_context(state: &AppState, headers: &HeaderMap, request_id: String) -> ViewerContext {
    let token = match extract_bearer(headers) {
        BearerToken::Missing => return ViewerContext::anonymous(request_id),
        BearerToken::Malformed => {
            return ViewerContext::invalid(request_id, "Malformed authorization header".to_string())
        }
        BearerToken::Present(token) => token,
    };

    let claims = match state.security.verify_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(%request_id, "Rejected bearer token: {}", e);
            return ViewerContext::invalid(request_id, "Invalid or expired token".to_string());
        }
    };

    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(_) => return ViewerContext::invalid(request_id, "Invalid token subject".to_string()),
    };

    // Role and verification state come from the store, not the token, so
    // changes take effect without re-login.
    match EntUser::gen_nullable(&state.db, user_id).await {
        Ok(Some(user)) => ViewerContext::authenticated(
            request_id,
            Viewer {
                user_id: user.id,
                name: user.name,
                role: user.role,
                email_verified: user.email_verified,
            },
        ),
        Ok(None) => ViewerContext::invalid(request_id, "Account no longer exists".to_string()),
        Err(e) => {
            warn!(%request_id, "Failed to load viewer {}: {}", user_id, e);
            ViewerContext::invalid(request_id, "Unable to authenticate".to_string())
        }
    }
}
