//! Timestamp utilities
//!
//! MythTV stores recording start times in UTC; orphan records keep local
//! wall-clock dates and times.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Interpret a naive timestamp as UTC
pub fn ensure_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}

/// Convert a UTC timestamp to the local time zone
pub fn utc_to_local(utc: DateTime<Utc>) -> DateTime<Local> {
    utc.with_timezone(&Local)
}
