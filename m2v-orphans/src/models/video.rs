//! Video catalog records (`videometadata`)
//!
//! Owned by the backend. This crate only looks rows up by (host, filename)
//! and overwrites a handful of descriptive fields.

use chrono::NaiveDate;
use serde::Serialize;

/// Catalog record for a registered video file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VideoMetadata {
    pub intid: i64,
    pub title: String,
    pub subtitle: String,
    /// Release year
    pub year: i64,
    pub releasedate: Option<NaiveDate>,
    /// Length in minutes
    pub length: i64,
    /// Path relative to the Videos storage group directory
    pub filename: String,
    pub host: String,
    /// Content classification (MOVIE, TELEVISION, ...)
    pub contenttype: String,
}
