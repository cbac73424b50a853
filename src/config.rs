//! Runtime tuning for the rules engine.
//!
//! Every gameplay constant lives here rather than inline in the components:
//! cooldowns, caps, combat coefficients, loot bounds and moderation limits
//! are configuration, not behavior. The process-wide default is loaded once
//! from the environment; tests inject a custom [`Tuning`] per engine.

use once_cell::sync::Lazy;
use std::env;

use crate::db::models::{MissionKind, RewardBundle};

/// Target and payout for one generated daily mission.
#[derive(Debug, Clone)]
pub struct MissionSpec {
    pub kind: MissionKind,
    pub target: i64,
    pub reward: RewardBundle,
}

#[derive(Debug, Clone)]
pub struct Tuning {
    // Progression
    pub max_building_level: i64,
    pub xp_per_level: i64,
    pub xp_per_cost_divisor: i64,

    // Accrual
    pub cap_per_townhall_level: i64,

    // Starting account state
    pub starting_coins: i64,
    pub starting_elixir: i64,
    pub starting_gems: i64,
    pub starting_trophies: i64,

    // Combat
    pub attack_cooldown_secs: i64,
    pub base_attack: i64,
    pub level_attack: i64,
    pub barracks_attack: i64,
    pub base_defense: i64,
    pub level_defense: i64,
    pub townhall_defense: i64,
    pub superpower_id: i64,
    pub superpower_boost: i64,
    pub loot_min_pct: f64,
    pub loot_max_pct: f64,
    pub loot_cap: i64,
    pub trophy_base: i64,
    pub trophy_gap_divisor: i64,
    pub trophy_floor: i64,
    pub trophy_cap: i64,
    pub loss_penalty_min: i64,
    pub loss_penalty_max: i64,
    pub xp_win: i64,
    pub xp_loss: i64,

    // Daily reward: `base * (1 + level * multiplier)` per resource
    pub daily_cooldown_secs: i64,
    pub daily_base_coins: i64,
    pub daily_base_elixir: i64,
    pub daily_base_gems: i64,
    pub daily_level_multiplier: i64,

    // Moderation
    pub forbidden_terms: Vec<String>,
    pub warning_threshold: i64,
    pub mute_secs: i64,

    // Daily missions
    pub missions: Vec<MissionSpec>,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            max_building_level: 10,
            xp_per_level: 1000,
            xp_per_cost_divisor: 100,

            cap_per_townhall_level: 50_000,

            starting_coins: 1000,
            starting_elixir: 1000,
            starting_gems: 50,
            starting_trophies: 1000,

            attack_cooldown_secs: 300,
            base_attack: 50,
            level_attack: 10,
            barracks_attack: 15,
            base_defense: 50,
            level_defense: 10,
            townhall_defense: 12,
            superpower_id: 8_285_797_031,
            superpower_boost: 10,
            loot_min_pct: 0.10,
            loot_max_pct: 0.20,
            loot_cap: 100_000,
            trophy_base: 10,
            trophy_gap_divisor: 100,
            trophy_floor: 5,
            trophy_cap: 40,
            loss_penalty_min: 5,
            loss_penalty_max: 15,
            xp_win: 150,
            xp_loss: 50,

            daily_cooldown_secs: 86_400,
            daily_base_coins: 500,
            daily_base_elixir: 400,
            daily_base_gems: 5,
            daily_level_multiplier: 1,

            forbidden_terms: ["cheater", "scammer", "free gems", "hack"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            warning_threshold: 3,
            mute_secs: 86_400,

            missions: vec![
                MissionSpec {
                    kind: MissionKind::CollectResources,
                    target: 50_000,
                    reward: RewardBundle { coins: 1000, elixir: 500, gems: 5 },
                },
                MissionSpec {
                    kind: MissionKind::WinAttacks,
                    target: 3,
                    reward: RewardBundle { coins: 1500, elixir: 750, gems: 10 },
                },
                MissionSpec {
                    kind: MissionKind::UpgradeBuilding,
                    target: 1,
                    reward: RewardBundle { coins: 2000, elixir: 1000, gems: 15 },
                },
                MissionSpec {
                    kind: MissionKind::SendClanMessages,
                    target: 5,
                    reward: RewardBundle { coins: 500, elixir: 250, gems: 3 },
                },
            ],
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

impl Tuning {
    /// Defaults overridden by the environment variables deployments commonly
    /// retune without a rebuild.
    pub fn from_env() -> Self {
        let mut t = Tuning::default();
        t.attack_cooldown_secs = env_i64("ATTACK_COOLDOWN_SECS", t.attack_cooldown_secs);
        t.daily_cooldown_secs = env_i64("DAILY_COOLDOWN_SECS", t.daily_cooldown_secs);
        t.mute_secs = env_i64("MUTE_SECS", t.mute_secs);
        t.superpower_id = env_i64("SUPERPOWER_ID", t.superpower_id);
        if let Ok(terms) = env::var("FORBIDDEN_TERMS") {
            t.forbidden_terms = terms
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        t
    }
}

static TUNING: Lazy<Tuning> = Lazy::new(Tuning::from_env);

/// Process-wide tuning loaded once from the environment.
pub fn tuning() -> &'static Tuning {
    &TUNING
}
