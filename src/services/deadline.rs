//! Deadline arithmetic for the attempt clock. Everything here is a pure
//! function of stored timestamps and a caller-supplied `now`, so a restart
//! never loses deadline state and every request re-derives the same answer.

use chrono::{DateTime, Duration, Utc};

pub fn deadline_for(started_at: DateTime<Utc>, duration_minutes: i64) -> DateTime<Utc> {
    started_at + Duration::minutes(duration_minutes)
}

/// Remaining seconds on the attempt clock, floored at zero.
pub fn remaining_seconds(
    started_at: DateTime<Utc>,
    duration_minutes: i64,
    now: DateTime<Utc>,
) -> i64 {
    seconds_left(deadline_for(started_at, duration_minutes), now)
}

pub fn seconds_left(deadline_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline_at - now).num_seconds().max(0)
}

pub fn is_expired(deadline_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= deadline_at
}
