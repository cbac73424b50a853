//! Player-filed moderation reports. Reports are resolved only by an explicit
//! admin action, never automatically.

use sqlx::SqliteExecutor;

use crate::db::models::Report;
use crate::error::{EngineError, Result};

pub async fn insert(
    ex: impl SqliteExecutor<'_>,
    reporter_id: i64,
    reported_user_id: i64,
    message_id: Option<i64>,
    reason: &str,
    now: i64,
) -> Result<i64> {
    Ok(sqlx::query(
        "INSERT INTO reports (reporter_id, reported_user_id, message_id, reason, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(reporter_id)
    .bind(reported_user_id)
    .bind(message_id)
    .bind(reason)
    .bind(now)
    .execute(ex)
    .await?
    .last_insert_rowid())
}

pub async fn pending(ex: impl SqliteExecutor<'_>) -> Result<Vec<Report>> {
    Ok(sqlx::query_as::<_, Report>(
        "SELECT * FROM reports WHERE status = 'pending' ORDER BY report_id DESC",
    )
    .fetch_all(ex)
    .await?)
}

pub async fn resolve(ex: impl SqliteExecutor<'_>, report_id: i64, now: i64) -> Result<()> {
    let affected = sqlx::query(
        "UPDATE reports
            SET status = 'resolved', resolved_at = ?
          WHERE report_id = ? AND status = 'pending'",
    )
    .bind(now)
    .bind(report_id)
    .execute(ex)
    .await?
    .rows_affected();

    if affected == 0 {
        Err(EngineError::NotFound)
    } else {
        Ok(())
    }
}
