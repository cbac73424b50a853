//! Player row access. Mutating helpers are written to be safe inside a
//! larger transaction; balance adjustments are floored at zero in SQL so a
//! concurrent-looking sequence of debits can never drive a balance negative.

use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use crate::config::Tuning;
use crate::db::models::{BuildingSet, ClanRole, Player};
use crate::error::{EngineError, Result};

pub async fn fetch(ex: impl SqliteExecutor<'_>, id: i64) -> Result<Option<Player>> {
    Ok(
        sqlx::query_as::<_, Player>("SELECT * FROM users WHERE user_id = ?")
            .bind(id)
            .fetch_optional(ex)
            .await?,
    )
}

/// Like [`fetch`], but an unknown id is an error.
pub async fn require(ex: impl SqliteExecutor<'_>, id: i64) -> Result<Player> {
    fetch(ex, id).await?.ok_or(EngineError::NotFound)
}

pub async fn name_taken(ex: impl SqliteExecutor<'_>, name: &str) -> Result<bool> {
    let taken: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE game_name = ?)")
            .bind(name)
            .fetch_one(ex)
            .await?;
    Ok(taken != 0)
}

/// Insert the account row with starting balances.
pub async fn insert(
    ex: impl SqliteExecutor<'_>,
    id: i64,
    name: &str,
    handle: Option<&str>,
    t: &Tuning,
    now: i64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO users
             (user_id, game_name, handle, coins, elixir, gems,
              last_resource_sync, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(handle)
    .bind(t.starting_coins)
    .bind(t.starting_elixir)
    .bind(t.starting_gems)
    .bind(now)
    .bind(now)
    .execute(ex)
    .await?;
    Ok(())
}

/// Adjust balances by signed deltas, flooring each at zero.
pub async fn add_resources(
    ex: impl SqliteExecutor<'_>,
    id: i64,
    coins: i64,
    elixir: i64,
    gems: i64,
) -> Result<()> {
    sqlx::query(
        "UPDATE users
            SET coins  = MAX(0, coins + ?),
                elixir = MAX(0, elixir + ?),
                gems   = MAX(0, gems + ?)
          WHERE user_id = ?",
    )
    .bind(coins)
    .bind(elixir)
    .bind(gems)
    .bind(id)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn set_progress(ex: impl SqliteExecutor<'_>, id: i64, level: i64, xp: i64) -> Result<()> {
    sqlx::query("UPDATE users SET level = ?, xp = ? WHERE user_id = ?")
        .bind(level)
        .bind(xp)
        .bind(id)
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn set_clan(
    ex: impl SqliteExecutor<'_>,
    id: i64,
    clan_id: Option<i64>,
    role: Option<ClanRole>,
) -> Result<()> {
    sqlx::query("UPDATE users SET clan_id = ?, clan_role = ? WHERE user_id = ?")
        .bind(clan_id)
        .bind(role)
        .bind(id)
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn fetch_buildings(
    ex: impl SqliteExecutor<'_>,
    id: i64,
) -> Result<Option<BuildingSet>> {
    Ok(
        sqlx::query_as::<_, BuildingSet>("SELECT * FROM buildings WHERE user_id = ?")
            .bind(id)
            .fetch_optional(ex)
            .await?,
    )
}

pub async fn insert_buildings(ex: impl SqliteExecutor<'_>, id: i64, level: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO buildings
             (user_id, townhall_level, mine_level, collector_level, barracks_level)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(level)
    .bind(level)
    .bind(level)
    .bind(level)
    .execute(ex)
    .await?;
    Ok(())
}

/// Partial update applied in a single statement.
#[derive(Debug, Clone, Default)]
pub struct PlayerPatch {
    pub coins: Option<i64>,
    pub elixir: Option<i64>,
    pub gems: Option<i64>,
    pub xp: Option<i64>,
    pub level: Option<i64>,
    pub warnings: Option<i64>,
    pub banned_until: Option<i64>,
    pub last_attack_time: Option<i64>,
    pub last_daily_claim: Option<i64>,
    pub last_resource_sync: Option<i64>,
    /// `Some(None)` clears clan membership.
    pub clan_id: Option<Option<i64>>,
    pub clan_role: Option<Option<ClanRole>>,
}

impl PlayerPatch {
    pub fn is_empty(&self) -> bool {
        self.coins.is_none()
            && self.elixir.is_none()
            && self.gems.is_none()
            && self.xp.is_none()
            && self.level.is_none()
            && self.warnings.is_none()
            && self.banned_until.is_none()
            && self.last_attack_time.is_none()
            && self.last_daily_claim.is_none()
            && self.last_resource_sync.is_none()
            && self.clan_id.is_none()
            && self.clan_role.is_none()
    }
}

pub async fn apply_patch(ex: impl SqliteExecutor<'_>, id: i64, patch: &PlayerPatch) -> Result<()> {
    if patch.is_empty() {
        return Ok(());
    }
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
    {
        let mut sep = qb.separated(", ");
        if let Some(v) = patch.coins {
            sep.push("coins = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.elixir {
            sep.push("elixir = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.gems {
            sep.push("gems = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.xp {
            sep.push("xp = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.level {
            sep.push("level = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.warnings {
            sep.push("warnings = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.banned_until {
            sep.push("banned_until = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.last_attack_time {
            sep.push("last_attack_time = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.last_daily_claim {
            sep.push("last_daily_claim = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.last_resource_sync {
            sep.push("last_resource_sync = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.clan_id {
            sep.push("clan_id = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.clan_role {
            sep.push("clan_role = ").push_bind_unseparated(v);
        }
    }
    qb.push(" WHERE user_id = ").push_bind(id);
    qb.build().execute(ex).await?;
    Ok(())
}
