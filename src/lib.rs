//! Rules engine for a text-based strategy game.
//!
//! The engine owns all economic and combat state for players and clans:
//! lazily-accrued resource production, building upgrades and XP progression,
//! probabilistic raid resolution with bounded loot, once-per-window daily
//! rewards, daily missions, chat moderation and trophy-based rankings.
//!
//! Presentation (menus, chat rendering, webhook transport) lives outside this
//! crate and consumes the command surface on [`engine::GameEngine`]. All state
//! is server-authoritative; client input is never trusted.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod game;
pub mod store;

pub use engine::GameEngine;
pub use error::EngineError;
pub use store::LedgerStore;
