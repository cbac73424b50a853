//! Typed failure surface of the engine.
//!
//! Every variant except `Storage` is a recoverable game-rule rejection that
//! callers translate into user-facing text. `Storage` wraps a database fault;
//! the in-flight transaction is rolled back before it propagates, so no
//! partial mutation is ever visible.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Unknown player, clan, building, message or report id.
    #[error("not found")]
    NotFound,

    /// A player record already exists under this id.
    #[error("account already exists")]
    AlreadyExists,

    /// Display name or clan name/tag already taken.
    #[error("name already taken")]
    DuplicateName,

    #[error("insufficient resources")]
    InsufficientResources,

    #[error("building is at max level")]
    MaxLevelReached,

    /// The gating cooldown has not elapsed yet.
    #[error("cooldown active, {0}s remaining")]
    CooldownActive(i64),

    /// Daily reward was already claimed inside the current window.
    #[error("daily reward already claimed")]
    AlreadyClaimed,

    /// The target account is banned for the given number of seconds.
    #[error("account banned, {0}s remaining")]
    Banned(i64),

    /// The author is muted and may not post for the given number of seconds.
    #[error("muted, {0}s remaining")]
    Muted(i64),

    /// Submitted text contains forbidden terms where none are tolerated
    /// (display names, clan names/tags).
    #[error("forbidden content")]
    ForbiddenContent,

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
