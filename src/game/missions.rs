//! Daily objectives.
//!
//! A fixed set is generated per player per calendar day; the component that
//! performs the underlying action reports progress here. Crossing the target
//! completes the mission and pays its reward exactly once; progress past the
//! target, or against a completed mission, is ignored.

use sqlx::{SqliteConnection, SqliteExecutor};

use crate::config::Tuning;
use crate::db::models::{Mission, MissionKind, RewardBundle};
use crate::db::player_repo;
use crate::error::Result;

/// Generate today's mission set if the player has none yet.
pub async fn ensure_daily(
    conn: &mut SqliteConnection,
    t: &Tuning,
    user_id: i64,
    today: i64,
) -> Result<()> {
    let have: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM missions WHERE user_id = ? AND created_day = ?")
            .bind(user_id)
            .bind(today)
            .fetch_one(&mut *conn)
            .await?;
    if have > 0 {
        return Ok(());
    }

    for spec in &t.missions {
        sqlx::query(
            "INSERT INTO missions
                 (user_id, kind, target_value, reward_coins, reward_elixir,
                  reward_gems, created_day)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(spec.kind)
        .bind(spec.target)
        .bind(spec.reward.coins)
        .bind(spec.reward.elixir)
        .bind(spec.reward.gems)
        .bind(today)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn list_for_day(
    ex: impl SqliteExecutor<'_>,
    user_id: i64,
    day: i64,
) -> Result<Vec<Mission>> {
    Ok(sqlx::query_as::<_, Mission>(
        "SELECT * FROM missions
          WHERE user_id = ? AND created_day = ?
          ORDER BY mission_id",
    )
    .bind(user_id)
    .bind(day)
    .fetch_all(ex)
    .await?)
}

/// Report progress on today's mission of the given kind. Returns the reward
/// when this increment completed the mission.
pub async fn bump(
    conn: &mut SqliteConnection,
    user_id: i64,
    kind: MissionKind,
    amount: i64,
    today: i64,
) -> Result<Option<RewardBundle>> {
    let mission = sqlx::query_as::<_, Mission>(
        "SELECT * FROM missions
          WHERE user_id = ? AND kind = ? AND created_day = ? AND completed = 0",
    )
    .bind(user_id)
    .bind(kind)
    .bind(today)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(mission) = mission else {
        return Ok(None);
    };

    let new_value = mission.current_value + amount;
    if new_value < mission.target_value {
        sqlx::query("UPDATE missions SET current_value = ? WHERE mission_id = ?")
            .bind(new_value)
            .bind(mission.mission_id)
            .execute(&mut *conn)
            .await?;
        return Ok(None);
    }

    sqlx::query("UPDATE missions SET current_value = ?, completed = 1 WHERE mission_id = ?")
        .bind(mission.target_value)
        .bind(mission.mission_id)
        .execute(&mut *conn)
        .await?;

    let reward = mission.reward();
    player_repo::add_resources(&mut *conn, user_id, reward.coins, reward.elixir, reward.gems)
        .await?;
    log::info!(
        "player {} completed mission {:?} (+{} coins, +{} elixir, +{} gems)",
        user_id,
        kind,
        reward.coins,
        reward.elixir,
        reward.gems
    );
    Ok(Some(reward))
}
