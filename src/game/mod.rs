pub mod accrual;
pub mod combat;
pub mod daily;
pub mod economy;
pub mod league;
pub mod missions;
pub mod moderation;

pub(crate) const SECS_PER_DAY: i64 = 86_400;

/// Calendar day of a unix timestamp, used to key daily mission sets.
pub(crate) fn day_of(ts: i64) -> i64 {
    ts.div_euclid(SECS_PER_DAY)
}
