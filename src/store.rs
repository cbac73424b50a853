//! Durable keyed storage plus the per-player serialization layer.
//!
//! Every mutating operation runs inside a [`PlayerTxn`]: the player's lock
//! (or, for combat, both players' locks in lower-id-first order) is taken
//! before the database transaction starts, and held until commit or
//! rollback. Locks strictly precede connection acquisition and no further
//! lock is taken once a transaction is open, so lock-ordering cycles cannot
//! form. Transactions stay short: accrual arithmetic and a handful of field
//! writes, never unbounded work.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{SqliteConnection, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::Tuning;
use crate::db::leaderboard_repo;
use crate::db::models::Player;
use crate::db::player_repo::{self, PlayerPatch};
use crate::db::schema;
use crate::error::{EngineError, Result};

pub struct LedgerStore {
    pool: SqlitePool,
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl LedgerStore {
    /// Open (creating if missing) a database file and apply the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .map_err(EngineError::Storage)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        Self::from_pool(pool).await
    }

    /// Fresh private in-memory database; the pool is pinned to a single
    /// connection so the database outlives individual checkouts.
    pub async fn in_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(EngineError::Storage)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        schema::migrate(&pool).await?;
        Ok(LedgerStore {
            pool,
            locks: DashMap::new(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn lock_handle(&self, id: i64) -> Arc<Mutex<()>> {
        self.locks.entry(id).or_default().clone()
    }

    /// Serialize on one player and open a transaction.
    pub async fn begin_for(&self, id: i64) -> Result<PlayerTxn> {
        let handle = self.lock_handle(id);
        let guard = handle.lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(PlayerTxn {
            _guards: vec![guard],
            tx,
        })
    }

    /// Serialize on a pair of players (combat). Locks are always taken in
    /// ascending id order so two opposed attacks cannot deadlock.
    pub async fn begin_for_pair(&self, a: i64, b: i64) -> Result<PlayerTxn> {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let mut guards = Vec::with_capacity(2);
        guards.push(self.lock_handle(first).lock_owned().await);
        if second != first {
            guards.push(self.lock_handle(second).lock_owned().await);
        }
        let tx = self.pool.begin().await?;
        Ok(PlayerTxn {
            _guards: guards,
            tx,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Option<Player>> {
        player_repo::fetch(&self.pool, id).await
    }

    /// Create the full record set for a new account: player row with
    /// starting balances, level-1 buildings and a leaderboard entry.
    pub async fn create(
        &self,
        id: i64,
        name: &str,
        handle: Option<&str>,
        t: &Tuning,
        now: i64,
    ) -> Result<Player> {
        let mut txn = self.begin_for(id).await?;
        if player_repo::fetch(txn.conn(), id).await?.is_some() {
            return Err(EngineError::AlreadyExists);
        }
        if player_repo::name_taken(txn.conn(), name).await? {
            return Err(EngineError::DuplicateName);
        }
        player_repo::insert(txn.conn(), id, name, handle, t, now).await?;
        player_repo::insert_buildings(txn.conn(), id, 1).await?;
        leaderboard_repo::insert(txn.conn(), id, t.starting_trophies, now).await?;
        txn.commit().await?;
        player_repo::require(&self.pool, id).await
    }

    /// Apply a partial field update in one atomic statement.
    pub async fn mutate(&self, id: i64, patch: PlayerPatch) -> Result<Player> {
        player_repo::apply_patch(&self.pool, id, &patch).await?;
        player_repo::require(&self.pool, id).await
    }
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("locked_players", &self.locks.len())
            .finish()
    }
}

/// An open transaction holding the owning player lock(s). Dropping without
/// [`PlayerTxn::commit`] rolls every write back.
pub struct PlayerTxn {
    _guards: Vec<OwnedMutexGuard<()>>,
    tx: Transaction<'static, sqlx::Sqlite>,
}

impl PlayerTxn {
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
