//! Orphan reconciliation
//!
//! Compares a recordings directory with the backend's recorded list and
//! records every matching file the backend no longer knows about. Orphans
//! are staged in memory and committed in one transaction, so a failed scan
//! leaves the previous orphan set as it was.

use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::catalog::{CatalogClient, ChannelInfo};
use crate::db::orphans::{count_orphans, replace_orphans};
use crate::error::{OrphanError, Result};
use crate::models::NewOrphan;
use crate::services::file_scanner::FileScanner;
use crate::services::filename_codec;

/// Approximate MPEG-2 recording rate used to estimate durations
pub const BYTES_PER_MINUTE: u64 = 38_928_300;

/// Estimated length in whole minutes, rounded half up
pub fn estimated_duration(size: u64) -> i64 {
    let minutes = size.saturating_add(BYTES_PER_MINUTE / 2) / BYTES_PER_MINUTE;
    i64::try_from(minutes).unwrap_or(i64::MAX)
}

/// File size as stored in the orphan table's signed column
fn stored_filesize(path: &Path, size: u64) -> Result<i64> {
    i64::try_from(size).map_err(|e| {
        OrphanError::file(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Builds the orphan set for one host
pub struct Reconciler {
    pool: SqlitePool,
    catalog: Arc<CatalogClient>,
    hostname: String,
}

impl Reconciler {
    pub fn new(pool: SqlitePool, catalog: Arc<CatalogClient>, hostname: impl Into<String>) -> Self {
        Self {
            pool,
            catalog,
            hostname: hostname.into(),
        }
    }

    /// Scan `directory` and persist its orphans, returning how many were created
    ///
    /// Refuses with [`OrphanError::State`] if orphans already exist and
    /// `override_existing` is false. With the override the existing set is
    /// replaced, but only once the whole directory has been processed.
    pub async fn scan(&self, directory: &Path, pattern: &str, override_existing: bool) -> Result<usize> {
        let existing = count_orphans(&self.pool).await?;
        if existing > 0 && !override_existing {
            return Err(OrphanError::State(format!(
                "{} orphan records already exist; rescan requires override",
                existing
            )));
        }

        let scanner = FileScanner::new(pattern)?;
        let files = scanner.scan(directory)?;
        let directory_str = directory.to_string_lossy().into_owned();

        let mut channels: HashMap<String, ChannelInfo> = HashMap::new();
        let mut staged = Vec::new();
        let mut cataloged = 0usize;

        for path in &files {
            let filename = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };

            if self.catalog.is_cataloged(&filename).await? {
                cataloged += 1;
                continue;
            }

            let name = filename_codec::parse(&filename)?;

            let channel = match channels.get(&name.channel_id) {
                Some(info) => info.clone(),
                None => {
                    let info = self.catalog.channel_info(&name.channel_id).await?;
                    channels.insert(name.channel_id.clone(), info.clone());
                    info
                }
            };

            let size = scanner.file_size(path)?;
            let start = name.start_local.naive_local();

            tracing::debug!(file = %filename, size, channel = %channel.chan_num, "Staging orphan");

            staged.push(NewOrphan {
                hostname: self.hostname.clone(),
                title: String::new(),
                directory: directory_str.clone(),
                filename,
                filesize: stored_filesize(path, size)?,
                duration: estimated_duration(size),
                start_date: start.date(),
                start_time: start.time(),
                subtitle: String::new(),
                channel_id: name.channel_id,
                channel_number: channel.numeric_channel(),
                channel_name: display_name(&channel),
            });
        }

        let created = replace_orphans(&self.pool, &staged, override_existing).await?;

        tracing::info!(
            directory = %directory.display(),
            scanned = files.len(),
            cataloged,
            orphans = created,
            "Orphan scan complete"
        );

        Ok(created)
    }
}

fn display_name(channel: &ChannelInfo) -> String {
    if channel.channel_name.trim().is_empty() {
        channel.call_sign.clone()
    } else {
        channel.channel_name.clone()
    }
}
