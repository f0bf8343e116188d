//! Orphan records
//!
//! An orphan is a recording file on the backend's disk that the backend's
//! catalog no longer references.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extension of generated preview clips (Ogg Theora/Vorbis)
pub const SAMPLE_EXTENSION: &str = "ogv";

/// Persisted orphan record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Orphan {
    pub intid: i64,
    pub hostname: String,
    pub title: String,
    pub directory: String,
    pub filename: String,
    /// Size on disk in bytes
    pub filesize: i64,
    /// Estimated duration in minutes (advisory, derived from size)
    pub duration: i64,
    /// Local start date
    pub start_date: NaiveDate,
    /// Local start time
    pub start_time: NaiveTime,
    pub subtitle: String,
    pub channel_id: String,
    pub channel_number: i64,
    pub channel_name: String,
}

impl Orphan {
    /// Name of this orphan's preview clip
    pub fn sample_name(&self) -> String {
        sample_name_for(&self.filename)
    }

    /// Full path of the recording file
    pub fn source_path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.filename)
    }
}

/// Orphan waiting to be inserted (no id yet)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrphan {
    pub hostname: String,
    pub title: String,
    pub directory: String,
    pub filename: String,
    pub filesize: i64,
    pub duration: i64,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub subtitle: String,
    pub channel_id: String,
    pub channel_number: i64,
    pub channel_name: String,
}

/// Preview clip name: the filename's stem plus [`SAMPLE_EXTENSION`]
pub fn sample_name_for(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    format!("{}.{}", stem, SAMPLE_EXTENSION)
}
