//! Lazy resource production.
//!
//! Nothing ticks in the background: production owed since the last sync
//! point is computed at the moment a player's state is touched, which makes
//! the result independent of how often anyone looks.

use serde::Serialize;
use sqlx::SqliteConnection;

use crate::config::Tuning;
use crate::db::models::{BuildingSet, MissionKind};
use crate::db::player_repo;
use crate::error::{EngineError, Result};
use crate::game::{day_of, missions};

/// Hourly coin output per mine level.
const MINE_RATES: [i64; 10] = [10, 25, 50, 100, 200, 400, 800, 1500, 3000, 6000];
/// Hourly elixir output per collector level.
const COLLECTOR_RATES: [i64; 10] = [8, 20, 40, 80, 160, 320, 640, 1200, 2400, 4800];

fn hourly_rate(table: &[i64; 10], level: i64) -> i64 {
    table[(level.clamp(1, table.len() as i64) - 1) as usize]
}

/// Resources produced over one accrual window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Production {
    pub coins: i64,
    pub elixir: i64,
}

impl Production {
    pub fn total(&self) -> i64 {
        self.coins + self.elixir
    }
}

/// Pure accrual arithmetic. Negative elapsed time (clock skew) produces
/// nothing; each gain is clamped so the post-add balance never exceeds the
/// town-hall storage cap.
pub fn produce(
    t: &Tuning,
    elapsed_secs: i64,
    buildings: &BuildingSet,
    coins: i64,
    elixir: i64,
) -> Production {
    if elapsed_secs <= 0 {
        return Production::default();
    }
    let cap = t.cap_per_townhall_level * buildings.townhall_level;
    let coin_gain = hourly_rate(&MINE_RATES, buildings.mine_level) * elapsed_secs / 3600;
    let elixir_gain =
        hourly_rate(&COLLECTOR_RATES, buildings.collector_level) * elapsed_secs / 3600;
    Production {
        coins: coin_gain.min((cap - coins).max(0)),
        elixir: elixir_gain.min((cap - elixir).max(0)),
    }
}

/// Credit production owed since the last sync point and advance it to `now`.
/// The sync point moves even when nothing was produced, so repeated
/// zero-delta calls cannot bank a backlog.
pub async fn apply(
    conn: &mut SqliteConnection,
    t: &Tuning,
    user_id: i64,
    now: i64,
) -> Result<Production> {
    let player = player_repo::require(&mut *conn, user_id).await?;
    let buildings = player_repo::fetch_buildings(&mut *conn, user_id)
        .await?
        .ok_or(EngineError::NotFound)?;

    let gained = produce(
        t,
        now - player.last_resource_sync,
        &buildings,
        player.coins,
        player.elixir,
    );

    sqlx::query(
        "UPDATE users
            SET coins = coins + ?, elixir = elixir + ?, last_resource_sync = ?
          WHERE user_id = ?",
    )
    .bind(gained.coins)
    .bind(gained.elixir)
    .bind(now)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    if gained.total() > 0 {
        missions::bump(
            conn,
            user_id,
            MissionKind::CollectResources,
            gained.total(),
            day_of(now),
        )
        .await?;
    }
    Ok(gained)
}
