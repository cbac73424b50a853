use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role of a player inside their clan. Exactly one `Leader` exists per clan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClanRole {
    Member,
    Elder,
    CoLeader,
    Leader,
}

/// Upgradeable structures; one set of levels per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    TownHall,
    Mine,
    Collector,
    Barracks,
}

impl BuildingKind {
    /// Column holding this building's level in the `buildings` table.
    pub(crate) fn level_column(self) -> &'static str {
        match self {
            BuildingKind::TownHall => "townhall_level",
            BuildingKind::Mine => "mine_level",
            BuildingKind::Collector => "collector_level",
            BuildingKind::Barracks => "barracks_level",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttackOutcome {
    Win,
    Lose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    CollectResources,
    WinAttacks,
    UpgradeBuilding,
    SendClanMessages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
}

/// One row of the `users` table. Trophies live on [`LeaderboardEntry`],
/// everything else a player owns directly is here. Timestamps are unix
/// seconds; `0` means "never".
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Player {
    pub user_id: i64,
    pub game_name: String,
    pub handle: Option<String>,
    pub coins: i64,
    pub elixir: i64,
    pub gems: i64,
    pub xp: i64,
    pub level: i64,
    pub clan_id: Option<i64>,
    pub clan_role: Option<ClanRole>,
    pub last_attack_time: i64,
    pub last_daily_claim: i64,
    pub last_resource_sync: i64,
    pub warnings: i64,
    pub banned_until: i64,
    pub created_at: i64,
}

impl Player {
    /// Seconds of ban remaining at `now`, or zero if not banned.
    pub fn ban_remaining(&self, now: i64) -> i64 {
        (self.banned_until - now).max(0)
    }
}

/// Building levels for one player, created together with the account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BuildingSet {
    pub user_id: i64,
    pub townhall_level: i64,
    pub mine_level: i64,
    pub collector_level: i64,
    pub barracks_level: i64,
    pub last_upgrade_time: i64,
}

impl BuildingSet {
    pub fn level(&self, kind: BuildingKind) -> i64 {
        match kind {
            BuildingKind::TownHall => self.townhall_level,
            BuildingKind::Mine => self.mine_level,
            BuildingKind::Collector => self.collector_level,
            BuildingKind::Barracks => self.barracks_level,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Clan {
    pub clan_id: i64,
    pub name: String,
    pub tag: Option<String>,
    pub description: String,
    pub leader_id: i64,
    pub member_count: i64,
    pub created_at: i64,
}

/// Append-only chat line; only `report_count` ever changes after insert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClanMessage {
    pub message_id: i64,
    pub clan_id: i64,
    pub user_id: i64,
    pub message: String,
    pub report_count: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub report_id: i64,
    pub reporter_id: i64,
    pub reported_user_id: i64,
    pub message_id: Option<i64>,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

/// Append-only audit record of one resolved attack.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttackRecord {
    pub attack_id: i64,
    pub attacker_id: i64,
    pub defender_id: i64,
    pub outcome: AttackOutcome,
    pub loot_coins: i64,
    pub loot_elixir: i64,
    pub attacker_trophy_delta: i64,
    pub defender_trophy_delta: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Mission {
    pub mission_id: i64,
    pub user_id: i64,
    pub kind: MissionKind,
    pub target_value: i64,
    pub current_value: i64,
    pub reward_coins: i64,
    pub reward_elixir: i64,
    pub reward_gems: i64,
    pub completed: bool,
    pub created_day: i64,
}

impl Mission {
    pub fn reward(&self) -> RewardBundle {
        RewardBundle {
            coins: self.reward_coins,
            elixir: self.reward_elixir,
            gems: self.reward_gems,
        }
    }
}

/// Authoritative trophy store plus season counters, one row per player.
/// League tier is derived from trophies on read and never persisted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub trophies: i64,
    pub season_wins: i64,
    pub season_losses: i64,
    pub last_season_reset: i64,
}

/// Resources granted by a daily claim or a completed mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBundle {
    pub coins: i64,
    pub elixir: i64,
    pub gems: i64,
}
