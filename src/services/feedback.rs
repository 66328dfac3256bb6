use crate::models::FeedbackSummary;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the feedback database
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A stored feedback entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub id: i64,
    pub hospital_id: String,
    pub rating: i64,
    pub comment: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Append-only store of visitor ratings
pub struct FeedbackStore {
    pool: SqlitePool,
}

impl FeedbackStore {
    /// Open (creating if needed) the SQLite database and run migrations
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, FeedbackError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Private in-memory database, used by tests and demos
    pub async fn in_memory() -> Result<Self, FeedbackError> {
        // Each in-memory connection is its own database, so keep exactly one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Record a rating (1-5) for a hospital
    pub async fn save(
        &self,
        hospital_id: &str,
        rating: u8,
        comment: &str,
    ) -> Result<i64, FeedbackError> {
        let hospital_id = hospital_id.trim();
        if hospital_id.is_empty() {
            return Err(FeedbackError::InvalidInput("hospital id is required".into()));
        }
        if !(1..=5).contains(&rating) {
            return Err(FeedbackError::InvalidInput(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }

        let query = r#"
            INSERT INTO feedback (hospital_id, rating, comment, timestamp)
            VALUES (?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(hospital_id)
            .bind(rating as i64)
            .bind(comment)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        tracing::debug!("Recorded feedback for {}: rating {}", hospital_id, rating);

        Ok(result.last_insert_rowid())
    }

    /// Average rating and count per hospital, ordered by hospital id
    pub async fn summary(&self) -> Result<Vec<FeedbackSummary>, FeedbackError> {
        let query = r#"
            SELECT hospital_id, AVG(rating) AS avg_rating, COUNT(*) AS cnt
            FROM feedback
            GROUP BY hospital_id
            ORDER BY hospital_id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<FeedbackSummary, FeedbackError> {
                Ok(FeedbackSummary {
                    hospital_id: row.try_get("hospital_id")?,
                    avg_rating: row.try_get("avg_rating")?,
                    count: row.try_get("cnt")?,
                })
            })
            .collect()
    }

    /// Most recent entries for one hospital
    pub async fn recent(&self, hospital_id: &str, limit: u32) -> Result<Vec<FeedbackEntry>, FeedbackError> {
        let query = r#"
            SELECT id, hospital_id, rating, comment, timestamp
            FROM feedback
            WHERE hospital_id = ?
            ORDER BY id DESC
            LIMIT ?
        "#;

        let rows = sqlx::query(query)
            .bind(hospital_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<FeedbackEntry, FeedbackError> {
                Ok(FeedbackEntry {
                    id: row.try_get("id")?,
                    hospital_id: row.try_get("hospital_id")?,
                    rating: row.try_get("rating")?,
                    comment: row.try_get("comment")?,
                    timestamp: row.try_get("timestamp")?,
                })
            })
            .collect()
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, FeedbackError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
