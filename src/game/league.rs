//! Trophy-ordered rankings and league tiers.
//!
//! The tier is a pure derivation from the trophy count; it is computed on
//! read and never stored. Banned accounts and the superpower account are
//! excluded from top-player listings (the superpower stays attackable, it
//! just does not occupy a rank).

use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;

use crate::config::Tuning;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum League {
    Bronze,
    Silver,
    Gold,
    Crystal,
    Champion,
    Legend,
}

/// Ascending entry thresholds; a trophy count belongs to the last tier whose
/// threshold it reaches.
const THRESHOLDS: [(i64, League); 6] = [
    (0, League::Bronze),
    (1000, League::Silver),
    (2000, League::Gold),
    (3000, League::Crystal),
    (4000, League::Champion),
    (5000, League::Legend),
];

impl League {
    pub fn from_trophies(trophies: i64) -> League {
        THRESHOLDS
            .iter()
            .rev()
            .find(|(min, _)| trophies >= *min)
            .map(|(_, league)| *league)
            .unwrap_or(League::Bronze)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            League::Bronze => "bronze",
            League::Silver => "silver",
            League::Gold => "gold",
            League::Crystal => "crystal",
            League::Champion => "champion",
            League::Legend => "legend",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedPlayer {
    pub user_id: i64,
    pub game_name: String,
    pub level: i64,
    pub trophies: i64,
    pub league: League,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct RankedClan {
    pub clan_id: i64,
    pub name: String,
    pub tag: Option<String>,
    pub member_count: i64,
    pub trophies: i64,
}

/// Top players by trophies (level breaks ties), excluding banned accounts
/// and the superpower account.
pub async fn top_players(
    ex: impl SqliteExecutor<'_>,
    t: &Tuning,
    n: i64,
    now: i64,
) -> Result<Vec<RankedPlayer>> {
    let rows = sqlx::query_as::<_, (i64, String, i64, i64)>(
        "SELECT u.user_id, u.game_name, u.level, l.trophies
           FROM users u
           JOIN leaderboard l ON l.user_id = u.user_id
          WHERE u.banned_until <= ? AND u.user_id <> ?
          ORDER BY l.trophies DESC, u.level DESC
          LIMIT ?",
    )
    .bind(now)
    .bind(t.superpower_id)
    .bind(n)
    .fetch_all(ex)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(user_id, game_name, level, trophies)| RankedPlayer {
            user_id,
            game_name,
            level,
            trophies,
            league: League::from_trophies(trophies),
        })
        .collect())
}

/// Top clans by summed member trophies.
pub async fn top_clans(ex: impl SqliteExecutor<'_>, n: i64) -> Result<Vec<RankedClan>> {
    Ok(sqlx::query_as::<_, RankedClan>(
        "SELECT c.clan_id, c.name, c.tag, c.member_count,
                COALESCE(SUM(l.trophies), 0) AS trophies
           FROM clans c
           LEFT JOIN users u ON u.clan_id = c.clan_id
           LEFT JOIN leaderboard l ON l.user_id = u.user_id
          GROUP BY c.clan_id
          ORDER BY trophies DESC, c.member_count DESC
          LIMIT ?",
    )
    .bind(n)
    .fetch_all(ex)
    .await?)
}
