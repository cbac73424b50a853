//! Probabilistic raid resolution.
//!
//! The pure [`resolve`] step draws the outcome and sizes loot and trophy
//! movement from an injected RNG; [`execute`] applies the resolution to both
//! records inside the caller's pairwise transaction. The designated
//! superpower account defends with a boosted multiplier and is meant to be
//! near-unbeatable.

use rand::Rng;
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::config::Tuning;
use crate::db::models::{AttackOutcome, MissionKind};
use crate::db::{attack_repo, leaderboard_repo, player_repo};
use crate::error::{EngineError, Result};
use crate::game::{day_of, economy, missions};

/// Combat-relevant view of one side.
#[derive(Debug, Clone, Copy)]
pub struct Combatant {
    pub level: i64,
    pub barracks_level: i64,
    pub townhall_level: i64,
    pub trophies: i64,
    pub coins: i64,
    pub elixir: i64,
    pub superpower: bool,
}

pub fn attack_power(t: &Tuning, level: i64, barracks_level: i64) -> i64 {
    t.base_attack + level * t.level_attack + barracks_level * t.barracks_attack
}

pub fn defense_power(t: &Tuning, level: i64, townhall_level: i64, superpower: bool) -> i64 {
    let base = t.base_defense + level * t.level_defense + townhall_level * t.townhall_defense;
    if superpower {
        base * t.superpower_boost
    } else {
        base
    }
}

pub fn win_probability(attack: i64, defense: i64) -> f64 {
    attack as f64 / (attack + defense) as f64
}

/// Trophy movement when the attacker wins: larger for beating a
/// higher-trophy defender, never below the floor for beating a lower one.
pub fn trophy_swing_on_win(t: &Tuning, attacker_trophies: i64, defender_trophies: i64) -> i64 {
    let gap = defender_trophies - attacker_trophies;
    (t.trophy_base + gap / t.trophy_gap_divisor).clamp(t.trophy_floor, t.trophy_cap)
}

fn roll_loot<R: Rng + ?Sized>(t: &Tuning, rng: &mut R, balance: i64) -> i64 {
    if balance <= 0 {
        return 0;
    }
    let pct = rng.random_range(t.loot_min_pct..=t.loot_max_pct);
    ((balance as f64 * pct) as i64).min(t.loot_cap)
}

/// Outcome of one resolved attack, with the trophy deltas as actually
/// applied (floored so neither side can go below zero).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Resolution {
    pub outcome: AttackOutcome,
    pub attack_power: i64,
    pub defense_power: i64,
    pub loot_coins: i64,
    pub loot_elixir: i64,
    pub attacker_trophy_delta: i64,
    pub defender_trophy_delta: i64,
}

/// Pure resolution: the first draw decides the outcome, further draws size
/// loot (win) or the trophy penalty (loss).
pub fn resolve<R: Rng + ?Sized>(
    t: &Tuning,
    rng: &mut R,
    attacker: &Combatant,
    defender: &Combatant,
) -> Resolution {
    let attack = attack_power(t, attacker.level, attacker.barracks_level);
    let defense = defense_power(t, defender.level, defender.townhall_level, defender.superpower);
    let p_win = win_probability(attack, defense);
    let draw: f64 = rng.random();

    if draw < p_win {
        let swing = trophy_swing_on_win(t, attacker.trophies, defender.trophies);
        Resolution {
            outcome: AttackOutcome::Win,
            attack_power: attack,
            defense_power: defense,
            loot_coins: roll_loot(t, rng, defender.coins),
            loot_elixir: roll_loot(t, rng, defender.elixir),
            attacker_trophy_delta: swing,
            defender_trophy_delta: -swing.min(defender.trophies),
        }
    } else {
        let penalty = rng.random_range(t.loss_penalty_min..=t.loss_penalty_max);
        Resolution {
            outcome: AttackOutcome::Lose,
            attack_power: attack,
            defense_power: defense,
            loot_coins: 0,
            loot_elixir: 0,
            attacker_trophy_delta: -penalty.min(attacker.trophies),
            defender_trophy_delta: penalty,
        }
    }
}

/// What the caller gets back from one attack.
#[derive(Debug, Clone, Serialize)]
pub struct CombatResult {
    pub record_id: i64,
    pub outcome: AttackOutcome,
    pub attack_power: i64,
    pub defense_power: i64,
    pub loot_coins: i64,
    pub loot_elixir: i64,
    pub attacker_trophy_delta: i64,
    pub defender_trophy_delta: i64,
    pub attacker_trophies: i64,
    pub xp_gained: i64,
    pub leveled_up: bool,
}

/// Resolve and apply one attack. Preconditions, each its own failure, in
/// order: defender exists, defender not banned, attacker cooldown elapsed.
/// Runs entirely inside the caller's attacker/defender transaction.
pub async fn execute<R: Rng + ?Sized>(
    conn: &mut SqliteConnection,
    t: &Tuning,
    rng: &mut R,
    attacker_id: i64,
    defender_id: i64,
    now: i64,
) -> Result<CombatResult> {
    let attacker = player_repo::require(&mut *conn, attacker_id).await?;

    let defender = player_repo::fetch(&mut *conn, defender_id)
        .await?
        .ok_or(EngineError::NotFound)?;
    if defender.banned_until > now {
        return Err(EngineError::Banned(defender.ban_remaining(now)));
    }
    if attacker.banned_until > now {
        return Err(EngineError::Banned(attacker.ban_remaining(now)));
    }

    let remaining = t.attack_cooldown_secs - (now - attacker.last_attack_time);
    if remaining > 0 {
        return Err(EngineError::CooldownActive(remaining));
    }

    let attacker_buildings = player_repo::fetch_buildings(&mut *conn, attacker_id)
        .await?
        .ok_or(EngineError::NotFound)?;
    let defender_buildings = player_repo::fetch_buildings(&mut *conn, defender_id)
        .await?
        .ok_or(EngineError::NotFound)?;
    let attacker_board = leaderboard_repo::fetch(&mut *conn, attacker_id).await?;
    let defender_board = leaderboard_repo::fetch(&mut *conn, defender_id).await?;

    let resolution = resolve(
        t,
        rng,
        &Combatant {
            level: attacker.level,
            barracks_level: attacker_buildings.barracks_level,
            townhall_level: attacker_buildings.townhall_level,
            trophies: attacker_board.trophies,
            coins: attacker.coins,
            elixir: attacker.elixir,
            superpower: attacker_id == t.superpower_id,
        },
        &Combatant {
            level: defender.level,
            barracks_level: defender_buildings.barracks_level,
            townhall_level: defender_buildings.townhall_level,
            trophies: defender_board.trophies,
            coins: defender.coins,
            elixir: defender.elixir,
            superpower: defender_id == t.superpower_id,
        },
    );
    let won = resolution.outcome == AttackOutcome::Win;

    if won {
        player_repo::add_resources(
            &mut *conn,
            attacker_id,
            resolution.loot_coins,
            resolution.loot_elixir,
            0,
        )
        .await?;
        player_repo::add_resources(
            &mut *conn,
            defender_id,
            -resolution.loot_coins,
            -resolution.loot_elixir,
            0,
        )
        .await?;
    }

    let attacker_trophies =
        leaderboard_repo::apply_delta(&mut *conn, attacker_id, resolution.attacker_trophy_delta)
            .await?;
    leaderboard_repo::apply_delta(&mut *conn, defender_id, resolution.defender_trophy_delta)
        .await?;
    leaderboard_repo::record_season_result(&mut *conn, attacker_id, won).await?;
    leaderboard_repo::record_season_result(&mut *conn, defender_id, !won).await?;

    sqlx::query("UPDATE users SET last_attack_time = ? WHERE user_id = ?")
        .bind(now)
        .bind(attacker_id)
        .execute(&mut *conn)
        .await?;

    let xp_gained = if won { t.xp_win } else { t.xp_loss };
    let (new_level, new_xp) = economy::apply_xp(t, attacker.level, attacker.xp + xp_gained);
    player_repo::set_progress(&mut *conn, attacker_id, new_level, new_xp).await?;

    let record_id = attack_repo::insert(
        &mut *conn,
        attacker_id,
        defender_id,
        resolution.outcome,
        resolution.loot_coins,
        resolution.loot_elixir,
        resolution.attacker_trophy_delta,
        resolution.defender_trophy_delta,
        now,
    )
    .await?;

    if won {
        missions::bump(conn, attacker_id, MissionKind::WinAttacks, 1, day_of(now)).await?;
    }

    log::info!(
        "attack {}: {} -> {} ({:?}, loot {}c/{}e)",
        record_id,
        attacker_id,
        defender_id,
        resolution.outcome,
        resolution.loot_coins,
        resolution.loot_elixir
    );
    Ok(CombatResult {
        record_id,
        outcome: resolution.outcome,
        attack_power: resolution.attack_power,
        defense_power: resolution.defense_power,
        loot_coins: resolution.loot_coins,
        loot_elixir: resolution.loot_elixir,
        attacker_trophy_delta: resolution.attacker_trophy_delta,
        defender_trophy_delta: resolution.defender_trophy_delta,
        attacker_trophies,
        xp_gained,
        leveled_up: new_level > attacker.level,
    })
}
