// ViewerContext - who is making this request

use crate::entities::UserRole;
use crate::types::UserId;

/// The authenticated account behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub name: String,
    pub role: UserRole,
    pub email_verified: bool,
}

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Outcome of reading the request's credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    /// A token was present but could not be accepted
    Invalid(String),
    Authenticated(Viewer),
}

#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    pub auth: AuthState,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        Self {
            request_id,
            auth: AuthState::Anonymous,
        }
    }

    pub fn invalid(request_id: String, reason: String) -> Self {
        Self {
            request_id,
            auth: AuthState::Invalid(reason),
        }
    }

    pub fn authenticated(request_id: String, viewer: Viewer) -> Self {
        Self {
            request_id,
            auth: AuthState::Authenticated(viewer),
        }
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        match &self.auth {
            AuthState::Authenticated(viewer) => Some(viewer),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.viewer().map(|v| v.user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.viewer().is_some()
    }
}
