// Security - password hashing, bearer tokens and random identifiers

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::AuthConfig;
use crate::entities::{EntUser, UserRole};
use crate::error::{AppError, AppResult};
use crate::types::UserId;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// JWT claims carried by every bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<UserId> {
        self.sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}

/// Authentication service: argon2 credentials and HS256 tokens
pub struct SecurityService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: AuthConfig,
}

impl SecurityService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }

    #[instrument(skip_all)]
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        Ok(password_hash.to_string())
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    pub fn issue_token(&self, user: &EntUser) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.jwt_expiry_hours)).timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Signature, expiry and issuer are checked; any failure is a 401.
    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer.as_str()]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    pub fn role_of(claims: &Claims) -> Option<UserRole> {
        UserRole::parse(&claims.role)
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// URL-safe random string from `bytes` bytes of OS randomness.
pub fn random_token(bytes: usize) -> String {
    let buf: Vec<u8> = (0..bytes).map(|_| rand::random::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::UserId;

    fn service() -> SecurityService {
        SecurityService::new(Config::for_tests().auth)
    }

    fn user(role: UserRole) -> EntUser {
        EntUser {
            id: UserId::new(17),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            role,
            email_verified: true,
            verification_token: None,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_round_trip() {
        let security = service();
        let hash = security.hash_password("correct horse").unwrap();
        assert!(security.verify_password("correct horse", &hash).unwrap());
        assert!(!security.verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_token_carries_subject_and_role() {
        let security = service();
        let token = security.issue_token(&user(UserRole::Admin)).unwrap();
        let claims = security.verify_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(17));
        assert_eq!(SecurityService::role_of(&claims), Some(UserRole::Admin));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let mut config = Config::for_tests().auth;
        config.jwt_secret = "another-secret".into();
        let token = SecurityService::new(config).issue_token(&user(UserRole::User)).unwrap();

        let err = service().verify_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a.b@example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn test_random_token_is_url_safe() {
        let token = random_token(12);
        assert_eq!(token.len(), 16);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, random_token(12));
    }
}
