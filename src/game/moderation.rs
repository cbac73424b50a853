//! Forbidden-content detection and escalating warning state.
//!
//! Flagged chat is still stored so moderators can audit it; the author's
//! warning counter climbs instead, and at the threshold a timed mute is
//! imposed via `banned_until`. Player-filed reports land in `pending` and
//! stay there until an admin resolves them.

use serde::Serialize;
use sqlx::SqliteConnection;

use crate::config::Tuning;
use crate::db::models::MissionKind;
use crate::db::{clan_repo, player_repo, report_repo};
use crate::error::{EngineError, Result};
use crate::game::{day_of, missions};

/// Case-insensitive substring scan; returns every matched term.
pub fn check(terms: &[String], text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    terms
        .iter()
        .filter(|term| !term.is_empty() && lower.contains(&term.to_lowercase()))
        .cloned()
        .collect()
}

pub fn is_clean(terms: &[String], text: &str) -> bool {
    check(terms, text).is_empty()
}

#[derive(Debug, Clone, Serialize)]
pub struct PostedMessage {
    pub message_id: i64,
    pub flagged: bool,
    pub matches: Vec<String>,
    pub warnings: i64,
    /// Set when this message pushed the author over the warning threshold.
    pub muted_until: Option<i64>,
}

/// Store a clan message, applying the moderation filter to its text.
pub async fn post_message(
    conn: &mut SqliteConnection,
    t: &Tuning,
    clan_id: i64,
    author_id: i64,
    text: &str,
    now: i64,
) -> Result<PostedMessage> {
    let author = player_repo::require(&mut *conn, author_id).await?;
    if author.banned_until > now {
        return Err(EngineError::Muted(author.ban_remaining(now)));
    }
    if !clan_repo::is_member(&mut *conn, clan_id, author_id).await? {
        return Err(EngineError::NotFound);
    }

    let matches = check(&t.forbidden_terms, text);
    let message_id = clan_repo::insert_message(&mut *conn, clan_id, author_id, text, now).await?;

    if matches.is_empty() {
        missions::bump(conn, author_id, MissionKind::SendClanMessages, 1, day_of(now)).await?;
        return Ok(PostedMessage {
            message_id,
            flagged: false,
            matches,
            warnings: author.warnings,
            muted_until: None,
        });
    }

    let warnings = author.warnings + 1;
    let muted_until = (warnings >= t.warning_threshold).then_some(now + t.mute_secs);
    sqlx::query("UPDATE users SET warnings = ?, banned_until = ? WHERE user_id = ?")
        .bind(warnings)
        .bind(muted_until.unwrap_or(author.banned_until))
        .bind(author_id)
        .execute(&mut *conn)
        .await?;

    log::warn!(
        "flagged message {} from player {} (warning {}/{})",
        message_id,
        author_id,
        warnings,
        t.warning_threshold
    );
    Ok(PostedMessage {
        message_id,
        flagged: true,
        matches,
        warnings,
        muted_until,
    })
}

/// File a report against a player, optionally tied to a specific message.
pub async fn file_report(
    conn: &mut SqliteConnection,
    reporter_id: i64,
    target_id: i64,
    message_id: Option<i64>,
    reason: &str,
    now: i64,
) -> Result<i64> {
    player_repo::require(&mut *conn, reporter_id).await?;
    player_repo::require(&mut *conn, target_id).await?;

    if let Some(mid) = message_id {
        clan_repo::fetch_message(&mut *conn, mid)
            .await?
            .ok_or(EngineError::NotFound)?;
        clan_repo::bump_report_count(&mut *conn, mid).await?;
    }

    let report_id =
        report_repo::insert(&mut *conn, reporter_id, target_id, message_id, reason, now).await?;
    log::info!(
        "report {} filed by {} against {}",
        report_id,
        reporter_id,
        target_id
    );
    Ok(report_id)
}
