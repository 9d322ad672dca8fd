// AccountService - signup, email verification and login

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::entities::ent_user::NewUser;
use crate::entities::{EntUser, Entity, UserRole};
use crate::error::{AppError, AppResult};
use crate::infrastructure::security::{is_valid_email, random_token};
use crate::infrastructure::{EmailSender, OutgoingEmail, SecurityService, SqliteDatabase};
use crate::types::UserId;

pub const MIN_PASSWORD_CHARS: usize = 8;
const VERIFICATION_TOKEN_BYTES: usize = 24;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: EntUser,
}

#[derive(Clone)]
pub struct AccountService {
    db: SqliteDatabase,
    security: Arc<SecurityService>,
    email: Arc<dyn EmailSender>,
    public_url: String,
}

impl AccountService {
    pub fn new(
        db: SqliteDatabase,
        security: Arc<SecurityService>,
        email: Arc<dyn EmailSender>,
        public_url: String,
    ) -> Self {
        Self {
            db,
            security,
            email,
            public_url,
        }
    }

    /// Creates an unverified account and mails the verification link.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: SignupRequest) -> AppResult<EntUser> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if !is_valid_email(&request.email) {
            return Err(AppError::Validation("A valid email address is required".to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }

        let token = random_token(VERIFICATION_TOKEN_BYTES);
        let id = EntUser::create(
            &self.db,
            NewUser {
                name: name.to_string(),
                email: request.email.trim().to_string(),
                password_hash: self.security.hash_password(&request.password)?,
                role: UserRole::User,
                email_verified: false,
                verification_token: Some(token.clone()),
            },
        )
        .await?;
        let user = EntUser::gen_enforce(&self.db, id).await?;
        info!("Registered user {}", id);

        let link = format!("{}/verify-email?token={}", self.public_url.trim_end_matches('/'), token);
        let mail = OutgoingEmail {
            to: user.email.clone(),
            subject: "Verify your GlobeTrotter account".to_string(),
            body: format!("Hi {}, confirm your email address: {}", user.name, link),
        };
        if let Err(e) = self.email.send(mail).await {
            warn!(user = %id, error = %e, "Verification email was not sent");
        }

        Ok(user)
    }

    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str) -> AppResult<EntUser> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::BadRequest("Verification token is required".to_string()));
        }
        let id = EntUser::verify_email(&self.db, token)
            .await?
            .ok_or_else(|| AppError::NotFound("Verification token is invalid or already used".to_string()))?;
        info!("User {} verified their email", id);
        EntUser::gen_enforce(&self.db, id).await
    }

    /// Same 401 for unknown email and wrong password.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = EntUser::find_by_email(&self.db, &request.email)
            .await?
            .ok_or_else(invalid)?;
        if !self.security.verify_password(&request.password, &user.password_hash)? {
            return Err(invalid());
        }

        let token = self.security.issue_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn me(&self, user_id: UserId) -> AppResult<EntUser> {
        EntUser::gen_enforce(&self.db, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::infrastructure::RecordingEmailSender;

    async fn service() -> (AccountService, RecordingEmailSender) {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let outbox = RecordingEmailSender::new();
        let service = AccountService::new(
            db,
            Arc::new(SecurityService::new(Config::for_tests().auth)),
            Arc::new(outbox.clone()),
            "http://app.test/".to_string(),
        );
        (service, outbox)
    }

    fn signup(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: "Alice".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_signup_verify_login() {
        let (service, outbox) = service().await;

        let user = service.signup(signup("Alice@Example.com", "longenough")).await.unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.email_verified);

        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        let token = sent[0]
            .body
            .split("token=")
            .nth(1)
            .unwrap()
            .to_string();
        assert!(sent[0].body.contains("http://app.test/verify-email?token="));

        let verified = service.verify_email(&token).await.unwrap();
        assert!(verified.email_verified);
        let err = service.verify_email(&token).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let auth = service
            .login(LoginRequest {
                email: "alice@example.com".into(),
                password: "longenough".into(),
            })
            .await
            .unwrap();
        assert!(!auth.token.is_empty());
        assert_eq!(auth.user.id, user.id);
    }

    #[tokio::test]
    async fn test_signup_validation_and_duplicates() {
        let (service, _outbox) = service().await;

        let err = service.signup(signup("not-an-email", "longenough")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = service.signup(signup("a@example.com", "short")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        service.signup(signup("a@example.com", "longenough")).await.unwrap();
        let err = service.signup(signup("A@example.com", "longenough")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let (service, _outbox) = service().await;
        service.signup(signup("a@example.com", "longenough")).await.unwrap();

        for (email, password) in [("a@example.com", "wrongpass"), ("b@example.com", "longenough")] {
            let err = service
                .login(LoginRequest {
                    email: email.into(),
                    password: password.into(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(_)));
        }
    }
}
