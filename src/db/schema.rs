//! Table definitions, applied idempotently at store start-up.

use sqlx::SqlitePool;

use crate::error::Result;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        user_id            INTEGER PRIMARY KEY,
        game_name          TEXT NOT NULL UNIQUE,
        handle             TEXT,
        coins              INTEGER NOT NULL DEFAULT 0,
        elixir             INTEGER NOT NULL DEFAULT 0,
        gems               INTEGER NOT NULL DEFAULT 0,
        xp                 INTEGER NOT NULL DEFAULT 0,
        level              INTEGER NOT NULL DEFAULT 1,
        clan_id            INTEGER,
        clan_role          TEXT,
        last_attack_time   INTEGER NOT NULL DEFAULT 0,
        last_daily_claim   INTEGER NOT NULL DEFAULT 0,
        last_resource_sync INTEGER NOT NULL DEFAULT 0,
        warnings           INTEGER NOT NULL DEFAULT 0,
        banned_until       INTEGER NOT NULL DEFAULT 0,
        created_at         INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (clan_id) REFERENCES clans (clan_id)
    )",
    "CREATE TABLE IF NOT EXISTS buildings (
        user_id           INTEGER PRIMARY KEY,
        townhall_level    INTEGER NOT NULL DEFAULT 1,
        mine_level        INTEGER NOT NULL DEFAULT 1,
        collector_level   INTEGER NOT NULL DEFAULT 1,
        barracks_level    INTEGER NOT NULL DEFAULT 1,
        last_upgrade_time INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (user_id) REFERENCES users (user_id)
    )",
    "CREATE TABLE IF NOT EXISTS clans (
        clan_id      INTEGER PRIMARY KEY AUTOINCREMENT,
        name         TEXT NOT NULL UNIQUE,
        tag          TEXT UNIQUE,
        description  TEXT NOT NULL DEFAULT '',
        leader_id    INTEGER NOT NULL,
        member_count INTEGER NOT NULL DEFAULT 1,
        created_at   INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (leader_id) REFERENCES users (user_id)
    )",
    "CREATE TABLE IF NOT EXISTS clan_messages (
        message_id   INTEGER PRIMARY KEY AUTOINCREMENT,
        clan_id      INTEGER NOT NULL,
        user_id      INTEGER NOT NULL,
        message      TEXT NOT NULL,
        report_count INTEGER NOT NULL DEFAULT 0,
        created_at   INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (clan_id) REFERENCES clans (clan_id),
        FOREIGN KEY (user_id) REFERENCES users (user_id)
    )",
    "CREATE TABLE IF NOT EXISTS reports (
        report_id        INTEGER PRIMARY KEY AUTOINCREMENT,
        reporter_id      INTEGER NOT NULL,
        reported_user_id INTEGER NOT NULL,
        message_id       INTEGER,
        reason           TEXT NOT NULL DEFAULT '',
        status           TEXT NOT NULL DEFAULT 'pending',
        created_at       INTEGER NOT NULL DEFAULT 0,
        resolved_at      INTEGER,
        FOREIGN KEY (reporter_id) REFERENCES users (user_id),
        FOREIGN KEY (reported_user_id) REFERENCES users (user_id),
        FOREIGN KEY (message_id) REFERENCES clan_messages (message_id)
    )",
    "CREATE TABLE IF NOT EXISTS attacks (
        attack_id              INTEGER PRIMARY KEY AUTOINCREMENT,
        attacker_id            INTEGER NOT NULL,
        defender_id            INTEGER NOT NULL,
        outcome                TEXT NOT NULL,
        loot_coins             INTEGER NOT NULL DEFAULT 0,
        loot_elixir            INTEGER NOT NULL DEFAULT 0,
        attacker_trophy_delta  INTEGER NOT NULL DEFAULT 0,
        defender_trophy_delta  INTEGER NOT NULL DEFAULT 0,
        created_at             INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (attacker_id) REFERENCES users (user_id),
        FOREIGN KEY (defender_id) REFERENCES users (user_id)
    )",
    "CREATE TABLE IF NOT EXISTS missions (
        mission_id    INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id       INTEGER NOT NULL,
        kind          TEXT NOT NULL,
        target_value  INTEGER NOT NULL,
        current_value INTEGER NOT NULL DEFAULT 0,
        reward_coins  INTEGER NOT NULL DEFAULT 0,
        reward_elixir INTEGER NOT NULL DEFAULT 0,
        reward_gems   INTEGER NOT NULL DEFAULT 0,
        completed     INTEGER NOT NULL DEFAULT 0,
        created_day   INTEGER NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users (user_id)
    )",
    "CREATE TABLE IF NOT EXISTS leaderboard (
        user_id           INTEGER PRIMARY KEY,
        trophies          INTEGER NOT NULL DEFAULT 0,
        season_wins       INTEGER NOT NULL DEFAULT 0,
        season_losses     INTEGER NOT NULL DEFAULT 0,
        last_season_reset INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (user_id) REFERENCES users (user_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_users_clan_id ON users (clan_id)",
    "CREATE INDEX IF NOT EXISTS idx_clan_messages_clan_id ON clan_messages (clan_id)",
    "CREATE INDEX IF NOT EXISTS idx_attacks_attacker_id ON attacks (attacker_id)",
    "CREATE INDEX IF NOT EXISTS idx_attacks_defender_id ON attacks (defender_id)",
    "CREATE INDEX IF NOT EXISTS idx_missions_user_day ON missions (user_id, created_day)",
    "CREATE INDEX IF NOT EXISTS idx_reports_status ON reports (status)",
];

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    for stmt in STATEMENTS {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}
