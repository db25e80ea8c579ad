use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreError;

const CREATE_SCORES: &str = r#"
CREATE TABLE IF NOT EXISTS scores (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT    NOT NULL,
    email      TEXT    NOT NULL,
    score      INTEGER NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

const CREATE_EMAIL_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS scores_email_score ON scores (email, score DESC)";

/// Creates the schema if it is absent. Safe to run on every start.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(CREATE_SCORES).execute(pool).await?;
    sqlx::query(CREATE_EMAIL_INDEX).execute(pool).await?;
    info!("Schema ready");
    Ok(())
}
