// EntUser - accounts, roles and email verification state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::error::{AppError, AppResult};
use crate::infrastructure::SqliteDatabase;
use crate::types::{Page, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub email_verified: bool,
    #[serde(skip)]
    pub verification_token: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for EntUser {
    type Id = UserId;
    const TABLE: &'static str = "users";
    const NAME: &'static str = "User";
}

/// Public profile embedded in posts, comments and notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<&EntUser> for UserSummary {
    fn from(user: &EntUser) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub verification_token: Option<String>,
}

impl EntUser {
    pub async fn create(db: &SqliteDatabase, new: NewUser) -> AppResult<UserId> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, password_hash, role, email_verified, verification_token, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(new.email.to_lowercase())
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.email_verified)
        .bind(&new.verification_token)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Email is already registered".to_string()),
            other => other,
        })?;

        Ok(UserId::new(result.last_insert_rowid()))
    }

    pub async fn find_by_email(db: &SqliteDatabase, email: &str) -> AppResult<Option<Self>> {
        let user = sqlx::query_as::<_, Self>("SELECT * FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(db.pool())
            .await?;
        Ok(user)
    }

    /// Consume a verification token. Returns the verified user, if the token matched one.
    pub async fn verify_email(db: &SqliteDatabase, token: &str) -> AppResult<Option<UserId>> {
        let id: Option<UserId> = sqlx::query_scalar(
            "UPDATE users SET email_verified = 1, verification_token = NULL
             WHERE verification_token = ? RETURNING id",
        )
        .bind(token)
        .fetch_optional(db.pool())
        .await?;
        Ok(id)
    }

    pub async fn set_role(db: &SqliteDatabase, id: UserId, role: UserRole) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role)
            .bind(id)
            .execute(db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(db: &SqliteDatabase, page: Page) -> AppResult<Vec<Self>> {
        let users = sqlx::query_as::<_, Self>(
            "SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(db.pool())
        .await?;
        Ok(users)
    }

    pub async fn summary(db: &SqliteDatabase, id: UserId) -> AppResult<Option<UserSummary>> {
        let summary = sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, avatar_url FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures;

    #[tokio::test]
    async fn test_email_is_unique_case_insensitively() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        fixtures::user(&db, "Alice").await;

        let err = EntUser::create(
            &db,
            NewUser {
                name: "Other".into(),
                email: "ALICE@example.com".into(),
                password_hash: "x".into(),
                role: UserRole::User,
                email_verified: false,
                verification_token: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_verify_email_consumes_token() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let id = EntUser::create(
            &db,
            NewUser {
                name: "Bob".into(),
                email: "bob@example.com".into(),
                password_hash: "x".into(),
                role: UserRole::User,
                email_verified: false,
                verification_token: Some("tok".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(EntUser::verify_email(&db, "tok").await.unwrap(), Some(id));
        assert_eq!(EntUser::verify_email(&db, "tok").await.unwrap(), None);
        assert!(EntUser::gen_enforce(&db, id).await.unwrap().email_verified);
    }
}
