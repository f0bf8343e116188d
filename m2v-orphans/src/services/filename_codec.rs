//! Recording filename codec
//!
//! MythTV names recordings `CCCC_YYYYMMDDHHMMSS.ext`: a 4-digit channel id,
//! an underscore, and the UTC start time. No other shape is accepted.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{OrphanError, Result};
use m2v_common::time::{ensure_utc, utc_to_local};

static RECORDING_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})_([0-9]{14})\..+$").expect("recording filename regex is valid")
});

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Values decoded from a recording filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingName {
    /// 4-digit channel id, leading zeros kept
    pub channel_id: String,
    /// Start time as embedded in the name
    pub start_utc: DateTime<Utc>,
    /// Start time in the local time zone
    pub start_local: DateTime<Local>,
}

/// Decode a recording filename
///
/// Fails with [`OrphanError::Format`] if the name does not match the
/// convention or the digits are not a real calendar time.
pub fn parse(filename: &str) -> Result<RecordingName> {
    let caps = RECORDING_FILENAME
        .captures(filename)
        .ok_or_else(|| OrphanError::Format(filename.to_string()))?;

    let naive = NaiveDateTime::parse_from_str(&caps[2], TIMESTAMP_FORMAT)
        .map_err(|_| OrphanError::Format(filename.to_string()))?;
    let start_utc = ensure_utc(naive);

    Ok(RecordingName {
        channel_id: caps[1].to_string(),
        start_utc,
        start_local: utc_to_local(start_utc),
    })
}

/// Build the canonical filename for a channel and UTC start time
pub fn format_filename(channel_id: &str, start_utc: DateTime<Utc>, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        channel_id,
        start_utc.format(TIMESTAMP_FORMAT),
        extension
    )
}
