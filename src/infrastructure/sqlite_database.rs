use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Transaction,
};
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Table definitions, created in dependency order.
const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            email_verified INTEGER NOT NULL DEFAULT 0,
            verification_token TEXT,
            avatar_url TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "trips",
        r#"
        CREATE TABLE IF NOT EXISTS trips (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            destination TEXT NOT NULL DEFAULT '',
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            travelers INTEGER NOT NULL DEFAULT 1,
            budget REAL NOT NULL DEFAULT 0,
            trip_type TEXT NOT NULL DEFAULT 'leisure',
            status TEXT NOT NULL DEFAULT 'planning',
            cover_image TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "cities",
        r#"
        CREATE TABLE IF NOT EXISTS cities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL COLLATE NOCASE,
            country TEXT NOT NULL COLLATE NOCASE,
            cost_index REAL NOT NULL DEFAULT 0,
            popularity REAL NOT NULL DEFAULT 0,
            UNIQUE (name, country)
        )
        "#,
    ),
    (
        "activities",
        r#"
        CREATE TABLE IF NOT EXISTS activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            city_id INTEGER NOT NULL REFERENCES cities(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            activity_type TEXT NOT NULL DEFAULT 'sightseeing',
            cost REAL NOT NULL DEFAULT 0,
            duration_hours REAL NOT NULL DEFAULT 1,
            description TEXT NOT NULL DEFAULT ''
        )
        "#,
    ),
    (
        "itinerary_entries",
        r#"
        CREATE TABLE IF NOT EXISTS itinerary_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trip_id INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
            city_id INTEGER NOT NULL REFERENCES cities(id),
            activity_id INTEGER REFERENCES activities(id) ON DELETE SET NULL,
            date TEXT NOT NULL,
            order_index INTEGER NOT NULL DEFAULT 0,
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "budgets",
        r#"
        CREATE TABLE IF NOT EXISTS budgets (
            trip_id INTEGER PRIMARY KEY REFERENCES trips(id) ON DELETE CASCADE,
            transport REAL NOT NULL DEFAULT 0,
            accommodation REAL NOT NULL DEFAULT 0,
            activities REAL NOT NULL DEFAULT 0,
            meals REAL NOT NULL DEFAULT 0,
            total REAL NOT NULL DEFAULT 0,
            daily_average REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "expenses",
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trip_id INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
            category TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "community_posts",
        r#"
        CREATE TABLE IF NOT EXISTS community_posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            trip_id INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            cover_image TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            search_text TEXT NOT NULL DEFAULT '',
            is_public INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'active',
            views INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "post_likes",
        r#"
        CREATE TABLE IF NOT EXISTS post_likes (
            post_id INTEGER NOT NULL REFERENCES community_posts(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            PRIMARY KEY (post_id, user_id)
        )
        "#,
    ),
    (
        "post_comments",
        r#"
        CREATE TABLE IF NOT EXISTS post_comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER NOT NULL REFERENCES community_posts(id) ON DELETE CASCADE,
            author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            text TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "post_clones",
        r#"
        CREATE TABLE IF NOT EXISTS post_clones (
            post_id INTEGER NOT NULL REFERENCES community_posts(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            cloned_trip_id INTEGER REFERENCES trips(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (post_id, user_id)
        )
        "#,
    ),
    (
        "notifications",
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            sender_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            trip_id INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
            post_id INTEGER REFERENCES community_posts(id) ON DELETE SET NULL,
            message TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            CHECK (recipient_id <> sender_id)
        )
        "#,
    ),
    (
        "shared_trips",
        r#"
        CREATE TABLE IF NOT EXISTS shared_trips (
            trip_id INTEGER PRIMARY KEY REFERENCES trips(id) ON DELETE CASCADE,
            slug TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_itinerary_trip_date_order ON itinerary_entries(trip_id, date, order_index)",
    "CREATE INDEX IF NOT EXISTS idx_trips_owner ON trips(owner_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_activities_city ON activities(city_id)",
    "CREATE INDEX IF NOT EXISTS idx_expenses_trip ON expenses(trip_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_posts_feed ON community_posts(status, is_public, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_posts_trip ON community_posts(trip_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON post_comments(post_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_notifications_unread ON notifications(recipient_id, is_read)",
];

/// SQLite-backed store shared by every service through a connection pool
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        if is_memory_url(&config.url) {
            return Self::new_in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid DATABASE_URL {}: {}", config.url, e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        if let Some(parent) = options.clone().get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::ConfigurationError(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to {}: {}", config.url, e))
            })?;

        info!("Connected to SQLite database at {}", config.url);
        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Every connection to `sqlite::memory:` is its own database, so the pool
    /// is pinned to a single connection that is never recycled.
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::ConfigurationError(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Create tables and indexes. Idempotent.
    pub async fn initialize(&self) -> AppResult<()> {
        for (table, ddl) in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await.map_err(|e| {
                AppError::DatabaseError(format!("Failed to create {} table: {}", table, e))
            })?;
        }

        for ddl in INDEXES {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to create index: {}", e)))?;
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> AppResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))
    }

    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
