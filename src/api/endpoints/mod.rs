//! API endpoint handlers.
//!
//! `appointments` belongs to the appointment service; `events` and
//! `notifications` to the notification service; `health` is mounted by
//! both.

pub mod appointments;
pub mod events;
pub mod health;
pub mod notifications;

use chrono::{NaiveDateTime, Timelike, Utc};

/// Current UTC time truncated to the second precision of the storage
/// format, so persisted and in-memory timestamps agree.
pub(crate) fn now_utc() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
