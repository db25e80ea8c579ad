use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;

use crate::{
    error::AppError, models::LeaderboardEntry, serializers::parse_submission, state::AppState,
};

pub const LEADERBOARD_SIZE: u32 = 10;

#[derive(Debug, Serialize)]
pub struct Submitted {
    pub ok: bool,
    pub rank: Option<i64>,
}

pub async fn leaderboard_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let entries = state.store.leaderboard(LEADERBOARD_SIZE).await?;

    Ok(Json(entries))
}

/// Validates the body before touching storage, so rejected submissions never
/// take a connection.
pub async fn submit_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Submitted>, AppError> {
    let submission = parse_submission(&body)?;
    let recorded = state.store.record(&submission).await?;

    Ok(Json(Submitted {
        ok: true,
        rank: recorded.rank,
    }))
}
