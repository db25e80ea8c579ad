//! # Storage
//!
//! Append-only log of score submissions in a single SQLite table.
//!
//! ## Ranking
//!
//! A player is an email. Their standing is the best score over all of their
//! rows, recomputed from the full table on every read.
//!
//! - Leaderboard: best score per email, descending. The name shown comes from
//!   the row that first reached that best score, and equal best scores are
//!   listed in the order they were reached.
//! - Rank: competition ranking (`RANK()`), so equal best scores share a rank
//!   and the next distinct score skips ahead by the size of the tie.
use std::{path::Path, time::Duration};

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Executor, Sqlite, SqlitePool,
};
use tracing::info;

use crate::{
    error::StoreError,
    migrate::migrate,
    models::{LeaderboardEntry, Recorded, ScoreEntry, Submission},
};

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const INSERT_SCORE: &str = r#"
INSERT INTO scores (name, email, score)
VALUES (?, ?, ?)
RETURNING id, name, email, score, created_at
"#;

const SELECT_LEADERBOARD: &str = r#"
WITH best AS (
    SELECT id, name, email, score,
           ROW_NUMBER() OVER (PARTITION BY email ORDER BY score DESC, id ASC) AS position
    FROM scores
)
SELECT name, email, score
FROM best
WHERE position = 1
ORDER BY score DESC, id ASC
LIMIT ?
"#;

const SELECT_RANK: &str = r#"
SELECT rank FROM (
    SELECT email, RANK() OVER (ORDER BY MAX(score) DESC) AS rank
    FROM scores
    GROUP BY email
)
WHERE email = ?
"#;

/// Storage handle the HTTP layer works against.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn insert(&self, submission: &Submission) -> Result<ScoreEntry, StoreError>;

    async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError>;

    async fn rank(&self, email: &str) -> Result<Option<i64>, StoreError>;

    /// Stores a submission and ranks its player against the updated table.
    async fn record(&self, submission: &Submission) -> Result<Recorded, StoreError> {
        let entry = self.insert(submission).await?;
        let rank = self.rank(&entry.email).await?;

        Ok(Recorded { entry, rank })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and installs the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        migrate(&pool).await?;
        info!("Opened score database at {}", path.display());

        Ok(Self { pool })
    }
}

#[async_trait]
impl ScoreStore for SqliteStore {
    async fn insert(&self, submission: &Submission) -> Result<ScoreEntry, StoreError> {
        insert_score(&self.pool, submission).await
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(SELECT_LEADERBOARD)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn rank(&self, email: &str) -> Result<Option<i64>, StoreError> {
        select_rank(&self.pool, email).await
    }

    async fn record(&self, submission: &Submission) -> Result<Recorded, StoreError> {
        // One connection for both statements; it goes back to the pool on drop.
        let mut conn = self.pool.acquire().await?;

        let entry = insert_score(&mut *conn, submission).await?;
        let rank = select_rank(&mut *conn, &entry.email).await?;

        Ok(Recorded { entry, rank })
    }
}

async fn insert_score<'e, E>(executor: E, submission: &Submission) -> Result<ScoreEntry, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let entry = sqlx::query_as::<_, ScoreEntry>(INSERT_SCORE)
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(submission.score)
        .fetch_one(executor)
        .await?;

    Ok(entry)
}

async fn select_rank<'e, E>(executor: E, email: &str) -> Result<Option<i64>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rank = sqlx::query_scalar::<_, i64>(SELECT_RANK)
        .bind(email)
        .fetch_optional(executor)
        .await?;

    Ok(rank)
}
