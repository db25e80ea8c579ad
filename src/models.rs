use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One persisted submission. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ScoreEntry {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub score: i64,
    pub created_at: NaiveDateTime,
}

/// A player's best score, as shown on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LeaderboardEntry {
    pub name: String,
    pub email: String,
    pub score: i64,
}

/// A validated score submission, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub score: i64,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub entry: ScoreEntry,
    pub rank: Option<i64>,
}
