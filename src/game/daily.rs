//! Once-per-window daily reward.

use sqlx::SqliteConnection;

use crate::config::Tuning;
use crate::db::models::RewardBundle;
use crate::db::player_repo;
use crate::error::{EngineError, Result};

/// Grant the level-scaled daily reward, at most once per window. Repeated
/// calls inside the window fail `AlreadyClaimed` and change nothing.
pub async fn claim(
    conn: &mut SqliteConnection,
    t: &Tuning,
    user_id: i64,
    now: i64,
) -> Result<RewardBundle> {
    let player = player_repo::require(&mut *conn, user_id).await?;

    if now - player.last_daily_claim < t.daily_cooldown_secs {
        return Err(EngineError::AlreadyClaimed);
    }

    let scale = 1 + player.level * t.daily_level_multiplier;
    let reward = RewardBundle {
        coins: t.daily_base_coins * scale,
        elixir: t.daily_base_elixir * scale,
        gems: t.daily_base_gems * scale,
    };

    player_repo::add_resources(&mut *conn, user_id, reward.coins, reward.elixir, reward.gems)
        .await?;
    sqlx::query("UPDATE users SET last_daily_claim = ? WHERE user_id = ?")
        .bind(now)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    log::info!(
        "player {} claimed daily reward ({}c/{}e/{}g)",
        user_id,
        reward.coins,
        reward.elixir,
        reward.gems
    );
    Ok(reward)
}
