use async_trait::async_trait;
use aura_core::{Feedback, ProfileStore, UserProfile};
use errors::StoreError;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

const BACKEND: &str = "sqlite";

fn query_error(e: sqlx::Error) -> StoreError {
    StoreError::Query {
        backend: BACKEND.to_string(),
        reason: e.to_string()
    }
}

fn serialization_error(e: serde_json::Error) -> StoreError {
    StoreError::Serialization {
        reason: e.to_string()
    }
}

/// Profile store backed by the SQLite identity database.
///
/// Profiles are stored as JSON documents keyed by `aura_id`. Saving an
/// existing profile replaces it.
#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    pool: SqlitePool
}

impl SqliteProfileStore {
    /// Open the database at `url` and create the schema if missing.
    ///
    /// In-memory URLs are held on a single connection so every query sees
    /// the same database.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection {
                backend: BACKEND.to_string(),
                reason: e.to_string()
            })?;

        let store = Self { pool };
        store.initialize_schema().await?;
        info!(url, "Profile store ready");
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS profiles (
                aura_id TEXT PRIMARY KEY,
                profile_json TEXT NOT NULL,
                last_updated BIGINT NOT NULL
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS feedback (
                id TEXT PRIMARY KEY,
                aura_id TEXT NOT NULL,
                url TEXT NOT NULL,
                helpful BOOLEAN NOT NULL,
                comment TEXT,
                timestamp BIGINT NOT NULL
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_feedback_aura_id ON feedback(aura_id)")
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(())
    }

    /// Feedback recorded for a profile, oldest first.
    pub async fn feedback_for(&self, aura_id: &str) -> Result<Vec<Feedback>, StoreError> {
        let rows = sqlx::query(
            "SELECT aura_id, url, helpful, comment FROM feedback
             WHERE aura_id = ? ORDER BY timestamp, rowid"
        )
        .bind(aura_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(rows
            .into_iter()
            .map(|row| Feedback {
                aura_id: row.get("aura_id"),
                url: row.get("url"),
                helpful: row.get("helpful"),
                comment: row.get("comment")
            })
            .collect())
    }

    /// Seconds since the epoch at which the profile was last saved.
    pub async fn last_updated(&self, aura_id: &str) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query("SELECT last_updated FROM profiles WHERE aura_id = ?")
            .bind(aura_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(row.map(|r| r.get("last_updated")))
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn save(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile).map_err(serialization_error)?;
        sqlx::query(
            "INSERT INTO profiles (aura_id, profile_json, last_updated) VALUES (?, ?, ?)
             ON CONFLICT(aura_id) DO UPDATE SET
                profile_json = excluded.profile_json,
                last_updated = excluded.last_updated"
        )
        .bind(&profile.aura_id)
        .bind(json)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        debug!(aura_id = %profile.aura_id, "Profile saved");
        Ok(())
    }

    async fn load(&self, aura_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query("SELECT profile_json FROM profiles WHERE aura_id = ?")
            .bind(aura_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let json: String = row.get("profile_json");
                serde_json::from_str(&json)
                    .map(Some)
                    .map_err(serialization_error)
            }
            None => Ok(None)
        }
    }

    async fn record_feedback(&self, feedback: &Feedback) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO feedback (id, aura_id, url, helpful, comment, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&feedback.aura_id)
        .bind(&feedback.url)
        .bind(feedback.helpful)
        .bind(&feedback.comment)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        debug!(aura_id = %feedback.aura_id, helpful = feedback.helpful, "Feedback recorded");
        Ok(())
    }
}
