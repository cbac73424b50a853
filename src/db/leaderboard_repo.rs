//! Trophy ledger and season counters.

use sqlx::SqliteExecutor;

use crate::db::models::LeaderboardEntry;
use crate::error::{EngineError, Result};

pub async fn insert(ex: impl SqliteExecutor<'_>, id: i64, trophies: i64, now: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO leaderboard (user_id, trophies, last_season_reset) VALUES (?, ?, ?)",
    )
    .bind(id)
    .bind(trophies)
    .bind(now)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn fetch(ex: impl SqliteExecutor<'_>, id: i64) -> Result<LeaderboardEntry> {
    sqlx::query_as::<_, LeaderboardEntry>("SELECT * FROM leaderboard WHERE user_id = ?")
        .bind(id)
        .fetch_optional(ex)
        .await?
        .ok_or(EngineError::NotFound)
}

/// Atomically apply a trophy delta and return the new count, floored at zero.
pub async fn apply_delta(ex: impl SqliteExecutor<'_>, id: i64, delta: i64) -> Result<i64> {
    let new: i64 = sqlx::query_scalar(
        "UPDATE leaderboard
             SET trophies = MAX(0, trophies + ?)
           WHERE user_id = ?
       RETURNING trophies",
    )
    .bind(delta)
    .bind(id)
    .fetch_one(ex)
    .await?;
    Ok(new)
}

pub async fn record_season_result(ex: impl SqliteExecutor<'_>, id: i64, won: bool) -> Result<()> {
    let stmt = if won {
        "UPDATE leaderboard SET season_wins = season_wins + 1 WHERE user_id = ?"
    } else {
        "UPDATE leaderboard SET season_losses = season_losses + 1 WHERE user_id = ?"
    };
    sqlx::query(stmt).bind(id).execute(ex).await?;
    Ok(())
}

/// Zero every season counter and stamp the reset time.
pub async fn reset_season(ex: impl SqliteExecutor<'_>, now: i64) -> Result<()> {
    sqlx::query(
        "UPDATE leaderboard
            SET season_wins = 0, season_losses = 0, last_season_reset = ?",
    )
    .bind(now)
    .execute(ex)
    .await?;
    Ok(())
}
