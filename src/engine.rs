//! Command surface consumed by the presentation layer.
//!
//! Every mutating command follows the same shape: take the acting player's
//! lock (both players' for combat), open a transaction, run accrual for the
//! touched accounts, dispatch to the owning component and commit. Cooldown
//! checks happen inside that transaction, so two near-simultaneous requests
//! from one player cannot both pass a gate.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::{self, Tuning};
use crate::db::clan_repo::{self, ClanInfo};
use crate::db::models::{
    AttackRecord, BuildingKind, BuildingSet, ClanMessage, Mission, Player, Report, RewardBundle,
};
use crate::db::{attack_repo, leaderboard_repo, player_repo, report_repo};
use crate::error::{EngineError, Result};
use crate::game::league::{self, League, RankedClan, RankedPlayer};
use crate::game::{accrual, combat, daily, day_of, economy, missions, moderation};
use crate::store::{LedgerStore, PlayerTxn};

/// Current account state handed back to the caller after accrual ran.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub player: Player,
    pub buildings: BuildingSet,
    pub trophies: i64,
    pub league: League,
    /// Resources credited by this sync.
    pub collected: accrual::Production,
}

pub struct GameEngine {
    store: LedgerStore,
    tuning: Tuning,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl GameEngine {
    pub fn new(store: LedgerStore) -> Self {
        Self::with_tuning(store, config::tuning().clone())
    }

    pub fn with_tuning(store: LedgerStore, tuning: Tuning) -> Self {
        Self::with_rng(store, tuning, Box::new(StdRng::from_os_rng()))
    }

    /// Inject the randomness source; tests pass a seeded or scripted RNG.
    pub fn with_rng(store: LedgerStore, tuning: Tuning, rng: Box<dyn RngCore + Send>) -> Self {
        GameEngine {
            store,
            tuning,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    async fn snapshot(
        &self,
        txn: &mut PlayerTxn,
        id: i64,
        collected: accrual::Production,
    ) -> Result<PlayerSnapshot> {
        let player = player_repo::require(txn.conn(), id).await?;
        let buildings = player_repo::fetch_buildings(txn.conn(), id)
            .await?
            .ok_or(EngineError::NotFound)?;
        let board = leaderboard_repo::fetch(txn.conn(), id).await?;
        Ok(PlayerSnapshot {
            player,
            buildings,
            trophies: board.trophies,
            league: League::from_trophies(board.trophies),
            collected,
        })
    }

    /// Create an account with its buildings, leaderboard entry and first
    /// daily mission set.
    pub async fn register(
        &self,
        id: i64,
        name: &str,
        handle: Option<&str>,
    ) -> Result<PlayerSnapshot> {
        let name = name.trim();
        if !moderation::is_clean(&self.tuning.forbidden_terms, name) {
            return Err(EngineError::ForbiddenContent);
        }

        let now = Self::now();
        self.store.create(id, name, handle, &self.tuning, now).await?;

        let mut txn = self.store.begin_for(id).await?;
        missions::ensure_daily(txn.conn(), &self.tuning, id, day_of(now)).await?;
        let snap = self.snapshot(&mut txn, id, accrual::Production::default()).await?;
        txn.commit().await?;

        log::info!("registered player {} ({})", id, name);
        Ok(snap)
    }

    /// Apply accrual and return the current snapshot. Calling twice with no
    /// elapsed time credits nothing the second time.
    pub async fn sync_and_get(&self, id: i64) -> Result<PlayerSnapshot> {
        let now = Self::now();
        let mut txn = self.store.begin_for(id).await?;
        let collected = accrual::apply(txn.conn(), &self.tuning, id, now).await?;
        missions::ensure_daily(txn.conn(), &self.tuning, id, day_of(now)).await?;
        let snap = self.snapshot(&mut txn, id, collected).await?;
        txn.commit().await?;
        Ok(snap)
    }

    pub async fn upgrade(&self, id: i64, kind: BuildingKind) -> Result<economy::LevelResult> {
        let now = Self::now();
        let mut txn = self.store.begin_for(id).await?;
        accrual::apply(txn.conn(), &self.tuning, id, now).await?;
        let result = economy::upgrade(txn.conn(), &self.tuning, id, kind, now).await?;
        txn.commit().await?;
        Ok(result)
    }

    /// Resolve an attack inside one transaction spanning both accounts.
    pub async fn attack(&self, attacker_id: i64, defender_id: i64) -> Result<combat::CombatResult> {
        if attacker_id == defender_id {
            return Err(EngineError::NotFound);
        }
        let now = Self::now();
        let mut txn = self.store.begin_for_pair(attacker_id, defender_id).await?;
        accrual::apply(txn.conn(), &self.tuning, attacker_id, now).await?;
        // Defender may not exist; combat reports that as its own failure.
        if player_repo::fetch(txn.conn(), defender_id).await?.is_some() {
            accrual::apply(txn.conn(), &self.tuning, defender_id, now).await?;
        }

        let mut rng = self.rng.lock().await;
        let result = combat::execute(
            txn.conn(),
            &self.tuning,
            rng.as_mut(),
            attacker_id,
            defender_id,
            now,
        )
        .await?;
        drop(rng);

        txn.commit().await?;
        Ok(result)
    }

    /// A uniformly random non-banned opponent; never self, never the
    /// superpower account (that one must be targeted deliberately).
    pub async fn random_opponent(&self, id: i64) -> Result<i64> {
        sqlx::query_scalar(
            "SELECT user_id FROM users
              WHERE user_id NOT IN (?, ?) AND banned_until <= ?
              ORDER BY RANDOM()
              LIMIT 1",
        )
        .bind(id)
        .bind(self.tuning.superpower_id)
        .bind(Self::now())
        .fetch_optional(self.store.pool())
        .await?
        .ok_or(EngineError::NotFound)
    }

    pub async fn claim_daily(&self, id: i64) -> Result<RewardBundle> {
        let now = Self::now();
        let mut txn = self.store.begin_for(id).await?;
        accrual::apply(txn.conn(), &self.tuning, id, now).await?;
        let reward = daily::claim(txn.conn(), &self.tuning, id, now).await?;
        txn.commit().await?;
        Ok(reward)
    }

    /// Today's missions, generating the daily set on first access.
    pub async fn missions(&self, id: i64) -> Result<Vec<Mission>> {
        let now = Self::now();
        let today = day_of(now);
        let mut txn = self.store.begin_for(id).await?;
        player_repo::require(txn.conn(), id).await?;
        missions::ensure_daily(txn.conn(), &self.tuning, id, today).await?;
        let list = missions::list_for_day(txn.conn(), id, today).await?;
        txn.commit().await?;
        Ok(list)
    }

    pub async fn create_clan(
        &self,
        name: &str,
        tag: Option<&str>,
        description: &str,
        leader_id: i64,
    ) -> Result<i64> {
        let name = name.trim();
        if !moderation::is_clean(&self.tuning.forbidden_terms, name)
            || !tag.map_or(true, |t| moderation::is_clean(&self.tuning.forbidden_terms, t))
        {
            return Err(EngineError::ForbiddenContent);
        }

        let now = Self::now();
        let mut txn = self.store.begin_for(leader_id).await?;
        let clan_id =
            clan_repo::create(txn.conn(), name, tag, description, leader_id, now).await?;
        txn.commit().await?;
        log::info!("clan {} ({}) created by {}", clan_id, name, leader_id);
        Ok(clan_id)
    }

    pub async fn join_clan(&self, clan_id: i64, player_id: i64) -> Result<()> {
        let mut txn = self.store.begin_for(player_id).await?;
        clan_repo::join(txn.conn(), clan_id, player_id).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Leave the current clan; a leaving leader disbands it.
    pub async fn leave_clan(&self, player_id: i64) -> Result<()> {
        let mut txn = self.store.begin_for(player_id).await?;
        clan_repo::leave(txn.conn(), player_id).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn disband_clan(&self, leader_id: i64) -> Result<()> {
        let mut txn = self.store.begin_for(leader_id).await?;
        let leader = player_repo::require(txn.conn(), leader_id).await?;
        let clan_id = leader.clan_id.ok_or(EngineError::NotFound)?;
        clan_repo::disband(txn.conn(), clan_id, leader_id).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn clan_info(&self, clan_id: i64) -> Result<ClanInfo> {
        let clan = clan_repo::fetch(self.store.pool(), clan_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        let trophies = clan_repo::trophy_total(self.store.pool(), clan_id).await?;
        let members = clan_repo::members(self.store.pool(), clan_id).await?;
        Ok(ClanInfo {
            clan,
            trophies,
            members,
        })
    }

    pub async fn post_clan_message(
        &self,
        clan_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<moderation::PostedMessage> {
        let now = Self::now();
        let mut txn = self.store.begin_for(author_id).await?;
        let posted =
            moderation::post_message(txn.conn(), &self.tuning, clan_id, author_id, text, now)
                .await?;
        txn.commit().await?;
        Ok(posted)
    }

    /// Latest messages of a clan, oldest first.
    pub async fn clan_messages(&self, clan_id: i64, limit: i64) -> Result<Vec<ClanMessage>> {
        if clan_repo::fetch(self.store.pool(), clan_id).await?.is_none() {
            return Err(EngineError::NotFound);
        }
        clan_repo::messages(self.store.pool(), clan_id, limit).await
    }

    pub async fn report(
        &self,
        reporter_id: i64,
        target_id: i64,
        message_id: Option<i64>,
        reason: &str,
    ) -> Result<i64> {
        let now = Self::now();
        let mut tx = self.store.pool().begin().await?;
        let report_id =
            moderation::file_report(&mut tx, reporter_id, target_id, message_id, reason, now)
                .await?;
        tx.commit().await?;
        Ok(report_id)
    }

    pub async fn pending_reports(&self) -> Result<Vec<Report>> {
        report_repo::pending(self.store.pool()).await
    }

    pub async fn resolve_report(&self, report_id: i64) -> Result<()> {
        report_repo::resolve(self.store.pool(), report_id, Self::now()).await
    }

    pub async fn attack_history(&self, id: i64, limit: i64) -> Result<Vec<AttackRecord>> {
        attack_repo::history(self.store.pool(), id, limit).await
    }

    pub async fn top_players(&self, n: i64) -> Result<Vec<RankedPlayer>> {
        league::top_players(self.store.pool(), &self.tuning, n, Self::now()).await
    }

    pub async fn top_clans(&self, n: i64) -> Result<Vec<RankedClan>> {
        league::top_clans(self.store.pool(), n).await
    }

    /// Admin: impose a timed ban.
    pub async fn set_ban(&self, id: i64, until: i64) -> Result<Player> {
        let patch = player_repo::PlayerPatch {
            banned_until: Some(until),
            ..Default::default()
        };
        self.store.mutate(id, patch).await
    }

    /// Admin: lift an active ban.
    pub async fn lift_ban(&self, id: i64) -> Result<Player> {
        self.set_ban(id, 0).await
    }

    /// Admin: zero all season counters.
    pub async fn reset_season(&self) -> Result<()> {
        leaderboard_repo::reset_season(self.store.pool(), Self::now()).await
    }

    /// Create the designated superpower account if it does not exist yet:
    /// max buildings, deep reserves, legend-tier trophies.
    pub async fn seed_superpower(&self) -> Result<()> {
        let id = self.tuning.superpower_id;
        if self.store.get(id).await?.is_some() {
            return Ok(());
        }

        let now = Self::now();
        let max = self.tuning.max_building_level;
        let mut txn = self.store.begin_for(id).await?;
        sqlx::query(
            "INSERT INTO users
                 (user_id, game_name, coins, elixir, gems, level,
                  last_resource_sync, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind("The Superpower")
        .bind(999_999_999_i64)
        .bind(999_999_999_i64)
        .bind(999_999_i64)
        .bind(100_i64)
        .bind(now)
        .bind(now)
        .execute(txn.conn())
        .await?;
        player_repo::insert_buildings(txn.conn(), id, max).await?;
        leaderboard_repo::insert(txn.conn(), id, 9_999, now).await?;
        txn.commit().await?;

        log::info!("seeded superpower account {}", id);
        Ok(())
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine").finish_non_exhaustive()
    }
}
