//! Append-only attack audit trail.

use sqlx::SqliteExecutor;

use crate::db::models::{AttackOutcome, AttackRecord};
use crate::error::Result;

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    ex: impl SqliteExecutor<'_>,
    attacker_id: i64,
    defender_id: i64,
    outcome: AttackOutcome,
    loot_coins: i64,
    loot_elixir: i64,
    attacker_trophy_delta: i64,
    defender_trophy_delta: i64,
    now: i64,
) -> Result<i64> {
    Ok(sqlx::query(
        "INSERT INTO attacks
             (attacker_id, defender_id, outcome, loot_coins, loot_elixir,
              attacker_trophy_delta, defender_trophy_delta, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(attacker_id)
    .bind(defender_id)
    .bind(outcome)
    .bind(loot_coins)
    .bind(loot_elixir)
    .bind(attacker_trophy_delta)
    .bind(defender_trophy_delta)
    .bind(now)
    .execute(ex)
    .await?
    .last_insert_rowid())
}

/// Most recent attacks the player took part in, on either side.
pub async fn history(
    ex: impl SqliteExecutor<'_>,
    player_id: i64,
    limit: i64,
) -> Result<Vec<AttackRecord>> {
    Ok(sqlx::query_as::<_, AttackRecord>(
        "SELECT * FROM attacks
          WHERE attacker_id = ? OR defender_id = ?
          ORDER BY attack_id DESC
          LIMIT ?",
    )
    .bind(player_id)
    .bind(player_id)
    .bind(limit)
    .fetch_all(ex)
    .await?)
}
