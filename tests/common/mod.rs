#![allow(dead_code)]

use clashlands::config::Tuning;
use clashlands::{GameEngine, LedgerStore};
use rand::RngCore;

pub async fn engine() -> GameEngine {
    engine_with(Tuning::default()).await
}

pub async fn engine_with(tuning: Tuning) -> GameEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = LedgerStore::in_memory().await.expect("in-memory store");
    GameEngine::with_tuning(store, tuning)
}

pub async fn engine_with_rng(tuning: Tuning, rng: Box<dyn RngCore + Send>) -> GameEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = LedgerStore::in_memory().await.expect("in-memory store");
    GameEngine::with_rng(store, tuning, rng)
}

pub async fn register(engine: &GameEngine, id: i64, name: &str) {
    engine.register(id, name, None).await.expect("register");
}

/// Rewind a persisted `users` timestamp column so a gate looks elapsed.
pub async fn backdate(engine: &GameEngine, id: i64, column: &str, secs: i64) {
    let then = chrono::Utc::now().timestamp() - secs;
    let stmt = format!("UPDATE users SET {column} = ? WHERE user_id = ?");
    sqlx::query(&stmt)
        .bind(then)
        .bind(id)
        .execute(engine.store().pool())
        .await
        .expect("backdate");
}

pub async fn set_balances(engine: &GameEngine, id: i64, coins: i64, elixir: i64) {
    sqlx::query("UPDATE users SET coins = ?, elixir = ? WHERE user_id = ?")
        .bind(coins)
        .bind(elixir)
        .bind(id)
        .execute(engine.store().pool())
        .await
        .expect("set balances");
}

pub async fn set_trophies(engine: &GameEngine, id: i64, trophies: i64) {
    sqlx::query("UPDATE leaderboard SET trophies = ? WHERE user_id = ?")
        .bind(trophies)
        .bind(id)
        .execute(engine.store().pool())
        .await
        .expect("set trophies");
}

/// RNG that replays a scripted sequence of unit-interval draws, cycling.
/// `next_u64` values are chosen so the standard f64 conversion
/// (`next_u64 >> 11` over 2^53) reproduces each scripted draw.
pub struct ScriptedRng {
    raw: Vec<u64>,
    at: usize,
}

impl ScriptedRng {
    pub fn new(draws: &[f64]) -> Self {
        let raw = draws
            .iter()
            .map(|d| ((d * (1u64 << 53) as f64) as u64) << 11)
            .collect();
        ScriptedRng { raw, at: 0 }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let v = self.raw[self.at % self.raw.len()];
        self.at += 1;
        v
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
