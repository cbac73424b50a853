//! Clan lifecycle, membership and chat storage.
//!
//! Membership rules live here next to the queries that enforce them, so the
//! `member_count` column can only move together with the rows it counts.

use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqliteExecutor};

use crate::db::models::{Clan, ClanMessage, ClanRole};
use crate::db::player_repo;
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClanMemberRow {
    pub user_id: i64,
    pub game_name: String,
    pub clan_role: ClanRole,
    pub level: i64,
    pub trophies: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClanInfo {
    pub clan: Clan,
    pub trophies: i64,
    pub members: Vec<ClanMemberRow>,
}

pub async fn fetch(ex: impl SqliteExecutor<'_>, id: i64) -> Result<Option<Clan>> {
    Ok(
        sqlx::query_as::<_, Clan>("SELECT * FROM clans WHERE clan_id = ?")
            .bind(id)
            .fetch_optional(ex)
            .await?,
    )
}

fn map_unique_violation(e: sqlx::Error) -> EngineError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => EngineError::DuplicateName,
        _ => EngineError::Storage(e),
    }
}

/// Insert the clan and seat the founder as leader. The founder must not
/// already belong to a clan; name and tag collisions map to `DuplicateName`.
pub async fn create(
    conn: &mut SqliteConnection,
    name: &str,
    tag: Option<&str>,
    description: &str,
    leader_id: i64,
    now: i64,
) -> Result<i64> {
    let leader = player_repo::require(&mut *conn, leader_id).await?;
    if leader.clan_id.is_some() {
        return Err(EngineError::AlreadyExists);
    }

    let clan_id = sqlx::query(
        "INSERT INTO clans (name, tag, description, leader_id, member_count, created_at)
         VALUES (?, ?, ?, ?, 1, ?)",
    )
    .bind(name)
    .bind(tag)
    .bind(description)
    .bind(leader_id)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(map_unique_violation)?
    .last_insert_rowid();

    player_repo::set_clan(&mut *conn, leader_id, Some(clan_id), Some(ClanRole::Leader)).await?;
    Ok(clan_id)
}

pub async fn join(conn: &mut SqliteConnection, clan_id: i64, player_id: i64) -> Result<()> {
    let player = player_repo::require(&mut *conn, player_id).await?;
    if player.clan_id.is_some() {
        return Err(EngineError::AlreadyExists);
    }
    if fetch(&mut *conn, clan_id).await?.is_none() {
        return Err(EngineError::NotFound);
    }

    player_repo::set_clan(&mut *conn, player_id, Some(clan_id), Some(ClanRole::Member)).await?;
    sqlx::query("UPDATE clans SET member_count = member_count + 1 WHERE clan_id = ?")
        .bind(clan_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Leave the current clan. A leaving leader disbands it: the clan always has
/// exactly one leader, so there is nobody left to hold the seat.
pub async fn leave(conn: &mut SqliteConnection, player_id: i64) -> Result<()> {
    let player = player_repo::require(&mut *conn, player_id).await?;
    let clan_id = player.clan_id.ok_or(EngineError::NotFound)?;

    if player.clan_role == Some(ClanRole::Leader) {
        return disband(conn, clan_id, player_id).await;
    }

    player_repo::set_clan(&mut *conn, player_id, None, None).await?;
    sqlx::query("UPDATE clans SET member_count = member_count - 1 WHERE clan_id = ?")
        .bind(clan_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Remove the clan, releasing every member. Leader only. Chat history is
/// kept for moderation audits.
pub async fn disband(conn: &mut SqliteConnection, clan_id: i64, actor_id: i64) -> Result<()> {
    let clan = fetch(&mut *conn, clan_id).await?.ok_or(EngineError::NotFound)?;
    if clan.leader_id != actor_id {
        return Err(EngineError::NotFound);
    }

    sqlx::query("UPDATE users SET clan_id = NULL, clan_role = NULL WHERE clan_id = ?")
        .bind(clan_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM clans WHERE clan_id = ?")
        .bind(clan_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn is_member(ex: impl SqliteExecutor<'_>, clan_id: i64, user_id: i64) -> Result<bool> {
    let found: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ? AND clan_id = ?)",
    )
    .bind(user_id)
    .bind(clan_id)
    .fetch_one(ex)
    .await?;
    Ok(found != 0)
}

/// Members ordered leadership first, then by trophies.
pub async fn members(ex: impl SqliteExecutor<'_>, clan_id: i64) -> Result<Vec<ClanMemberRow>> {
    Ok(sqlx::query_as::<_, ClanMemberRow>(
        "SELECT u.user_id, u.game_name, u.clan_role, u.level, l.trophies
           FROM users u
           JOIN leaderboard l ON l.user_id = u.user_id
          WHERE u.clan_id = ?
          ORDER BY CASE u.clan_role
                     WHEN 'leader' THEN 1
                     WHEN 'co_leader' THEN 2
                     WHEN 'elder' THEN 3
                     ELSE 4
                   END,
                   l.trophies DESC",
    )
    .bind(clan_id)
    .fetch_all(ex)
    .await?)
}

/// Sum of member trophies; the clan table never stores its own copy.
pub async fn trophy_total(ex: impl SqliteExecutor<'_>, clan_id: i64) -> Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COALESCE(SUM(l.trophies), 0)
           FROM users u
           JOIN leaderboard l ON l.user_id = u.user_id
          WHERE u.clan_id = ?",
    )
    .bind(clan_id)
    .fetch_one(ex)
    .await?)
}

pub async fn insert_message(
    ex: impl SqliteExecutor<'_>,
    clan_id: i64,
    user_id: i64,
    text: &str,
    now: i64,
) -> Result<i64> {
    Ok(sqlx::query(
        "INSERT INTO clan_messages (clan_id, user_id, message, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(clan_id)
    .bind(user_id)
    .bind(text)
    .bind(now)
    .execute(ex)
    .await?
    .last_insert_rowid())
}

/// Latest `limit` messages, returned oldest first for display.
pub async fn messages(
    ex: impl SqliteExecutor<'_>,
    clan_id: i64,
    limit: i64,
) -> Result<Vec<ClanMessage>> {
    let rows = sqlx::query_as::<_, ClanMessage>(
        "SELECT * FROM clan_messages
          WHERE clan_id = ?
          ORDER BY message_id DESC
          LIMIT ?",
    )
    .bind(clan_id)
    .bind(limit)
    .fetch_all(ex)
    .await?;
    Ok(rows.into_iter().rev().collect())
}

pub async fn fetch_message(
    ex: impl SqliteExecutor<'_>,
    message_id: i64,
) -> Result<Option<ClanMessage>> {
    Ok(
        sqlx::query_as::<_, ClanMessage>("SELECT * FROM clan_messages WHERE message_id = ?")
            .bind(message_id)
            .fetch_optional(ex)
            .await?,
    )
}

pub async fn bump_report_count(ex: impl SqliteExecutor<'_>, message_id: i64) -> Result<()> {
    sqlx::query("UPDATE clan_messages SET report_count = report_count + 1 WHERE message_id = ?")
        .bind(message_id)
        .execute(ex)
        .await?;
    Ok(())
}
