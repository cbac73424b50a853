//! Building upgrades and XP progression.

use serde::Serialize;
use sqlx::SqliteConnection;

use crate::config::Tuning;
use crate::db::models::{BuildingKind, MissionKind};
use crate::db::player_repo;
use crate::error::{EngineError, Result};
use crate::game::{day_of, missions};

// Cost to raise a building one level, indexed by current level - 1. Charged
// to coins and elixir alike.
const TOWNHALL_COSTS: [i64; 9] = [
    5_000, 15_000, 50_000, 150_000, 500_000, 1_500_000, 5_000_000, 10_000_000, 25_000_000,
];
const MINE_COSTS: [i64; 9] = [
    750, 3_000, 12_000, 50_000, 200_000, 800_000, 3_000_000, 8_000_000, 20_000_000,
];
const COLLECTOR_COSTS: [i64; 9] = MINE_COSTS;
const BARRACKS_COSTS: [i64; 9] = [
    2_500, 10_000, 40_000, 150_000, 600_000, 2_400_000, 9_000_000, 20_000_000, 50_000_000,
];

/// Cost of the next level, or `None` at the cap.
pub fn upgrade_cost(t: &Tuning, kind: BuildingKind, current_level: i64) -> Option<i64> {
    if current_level >= t.max_building_level || current_level < 1 {
        return None;
    }
    let table = match kind {
        BuildingKind::TownHall => &TOWNHALL_COSTS,
        BuildingKind::Mine => &MINE_COSTS,
        BuildingKind::Collector => &COLLECTOR_COSTS,
        BuildingKind::Barracks => &BARRACKS_COSTS,
    };
    table.get((current_level - 1) as usize).copied()
}

/// Bank XP into levels. One grant may cascade through several levels; the
/// leftover always satisfies `xp < level * xp_per_level`.
pub fn apply_xp(t: &Tuning, mut level: i64, mut xp: i64) -> (i64, i64) {
    while xp >= level * t.xp_per_level {
        xp -= level * t.xp_per_level;
        level += 1;
    }
    (level, xp)
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelResult {
    pub building: BuildingKind,
    pub new_level: i64,
    pub cost: i64,
    pub xp_gained: i64,
    pub player_level: i64,
    pub leveled_up: bool,
}

pub async fn upgrade(
    conn: &mut SqliteConnection,
    t: &Tuning,
    user_id: i64,
    kind: BuildingKind,
    now: i64,
) -> Result<LevelResult> {
    let player = player_repo::require(&mut *conn, user_id).await?;
    let buildings = player_repo::fetch_buildings(&mut *conn, user_id)
        .await?
        .ok_or(EngineError::NotFound)?;

    let current = buildings.level(kind);
    let cost = upgrade_cost(t, kind, current).ok_or(EngineError::MaxLevelReached)?;
    if player.coins < cost || player.elixir < cost {
        return Err(EngineError::InsufficientResources);
    }

    player_repo::add_resources(&mut *conn, user_id, -cost, -cost, 0).await?;

    let column = kind.level_column();
    let stmt = format!(
        "UPDATE buildings SET {column} = {column} + 1, last_upgrade_time = ? WHERE user_id = ?"
    );
    sqlx::query(&stmt)
        .bind(now)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    let xp_gained = cost / t.xp_per_cost_divisor;
    let (new_player_level, new_xp) = apply_xp(t, player.level, player.xp + xp_gained);
    player_repo::set_progress(&mut *conn, user_id, new_player_level, new_xp).await?;

    missions::bump(conn, user_id, MissionKind::UpgradeBuilding, 1, day_of(now)).await?;

    log::info!(
        "player {} upgraded {:?} to level {}",
        user_id,
        kind,
        current + 1
    );
    Ok(LevelResult {
        building: kind,
        new_level: current + 1,
        cost,
        xp_gained,
        player_level: new_player_level,
        leveled_up: new_player_level > player.level,
    })
}
