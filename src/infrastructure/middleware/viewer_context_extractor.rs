// ViewerContext extractors - guards are types, so a route's requirements are
// visible in its handler signature and checked before the body runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::infrastructure::viewer::{AuthState, Viewer, ViewerContext};
use crate::types::UserId;

/// Request-scoped viewer context as installed by the middleware
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl Vc {
    pub fn new(vc: Arc<ViewerContext>) -> Self {
        Self(vc)
    }
}

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or_else(|| AppError::Internal("ViewerContext middleware is not installed".to_string()))
    }
}

/// A requirement an authenticated viewer must meet
pub trait Capability {
    fn check(viewer: &Viewer) -> AppResult<()>;
}

/// Any valid token
pub struct Authenticated;

/// Valid token and a verified email address
pub struct Verified;

/// Valid token and the admin role
pub struct Admin;

impl Capability for Authenticated {
    fn check(_viewer: &Viewer) -> AppResult<()> {
        Ok(())
    }
}

impl Capability for Verified {
    fn check(viewer: &Viewer) -> AppResult<()> {
        if viewer.email_verified {
            Ok(())
        } else {
            Err(AppError::EmailNotVerified)
        }
    }
}

impl Capability for Admin {
    fn check(viewer: &Viewer) -> AppResult<()> {
        if viewer.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

impl<A: Capability, B: Capability> Capability for (A, B) {
    fn check(viewer: &Viewer) -> AppResult<()> {
        A::check(viewer)?;
        B::check(viewer)
    }
}

/// Extractor that rejects with 401 when there is no valid viewer and with
/// the capability's error when the viewer lacks it.
pub struct Require<C: Capability = Authenticated> {
    pub viewer: Viewer,
    pub request_id: String,
    _capability: PhantomData<fn() -> C>,
}

impl<C: Capability> Require<C> {
    pub fn user_id(&self) -> UserId {
        self.viewer.user_id
    }

    fn from_context(vc: &ViewerContext) -> AppResult<Self> {
        match &vc.auth {
            AuthState::Anonymous => Err(AppError::Unauthorized("Authentication required".to_string())),
            AuthState::Invalid(reason) => Err(AppError::Unauthorized(reason.clone())),
            AuthState::Authenticated(viewer) => {
                C::check(viewer)?;
                Ok(Self {
                    viewer: viewer.clone(),
                    request_id: vc.request_id.clone(),
                    _capability: PhantomData,
                })
            }
        }
    }
}

impl<S, C> FromRequestParts<S> for Require<C>
where
    S: Send + Sync,
    C: Capability,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let vc = Vc::from_request_parts(parts, state).await?;
        Self::from_context(&vc)
    }
}

/// Viewer when a valid token was sent, `None` otherwise. Never rejects.
pub struct OptionalViewer(pub Option<Viewer>);

impl OptionalViewer {
    pub fn user_id(&self) -> Option<UserId> {
        self.0.as_ref().map(|v| v.user_id)
    }
}

impl<S> FromRequestParts<S> for OptionalViewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let vc = Vc::from_request_parts(parts, state).await?;
        Ok(OptionalViewer(vc.viewer().cloned()))
    }
}
