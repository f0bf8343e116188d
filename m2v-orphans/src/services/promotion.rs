//! Orphan promotion into the video catalog
//!
//! Copies an orphan's recording under the Videos storage group, registers it
//! with the backend and fills in the catalog record from the orphan. The
//! record is read and written in the backend's catalog database; only the
//! orphan row lives in the orphan store. A copy that was made before a later
//! step fails is left in place.

use chrono::Datelike;
use sqlx::SqlitePool;
use std::fs::{File, FileTimes};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{CatalogClient, VIDEOS_GROUP};
use crate::db::orphans::delete_orphan;
use crate::db::videos::{find_videos, save_video, CatalogDb};
use crate::error::{OrphanError, Result};
use crate::models::{Orphan, VideoMetadata};

/// Subdirectory a title is filed under
pub fn title_subdirectory(title: &str) -> String {
    title.replace(' ', "_")
}

pub struct PromotionService {
    /// Orphan store
    pool: SqlitePool,
    /// Backend's catalog database, where `Video/AddVideo` inserts
    catalog_db: CatalogDb,
    catalog: Arc<CatalogClient>,
    local_hostname: String,
}

impl PromotionService {
    /// `local_hostname` is the host this process runs on
    pub fn new(
        pool: SqlitePool,
        catalog_db: CatalogDb,
        catalog: Arc<CatalogClient>,
        local_hostname: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            catalog_db,
            catalog,
            local_hostname: local_hostname.into(),
        }
    }

    /// Promote one orphan to a cataloged video
    ///
    /// `target_host` defaults to the backend host and must be this host.
    /// With `delete_source`, the recording file and orphan record are removed
    /// once the catalog record has been saved.
    pub async fn promote(
        &self,
        orphan: &Orphan,
        target_host: Option<&str>,
        delete_source: bool,
    ) -> Result<VideoMetadata> {
        let host = target_host.unwrap_or_else(|| self.catalog.backend_host()).to_string();
        if host != self.local_hostname {
            return Err(OrphanError::Unsupported(format!(
                "cross-host promotion to {} from {}",
                host, self.local_hostname
            )));
        }
        if orphan.title.trim().is_empty() {
            return Err(OrphanError::Validation(format!(
                "orphan {} has no title",
                orphan.filename
            )));
        }

        let subdir = title_subdirectory(&orphan.title);
        let videos_dir = self
            .catalog
            .storage_directory(VIDEOS_GROUP, &host)
            .await
            .ok_or_else(|| {
                OrphanError::Lookup(format!("no {} storage group on host {}", VIDEOS_GROUP, host))
            })?;

        let target_dir = videos_dir.join(&subdir);
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|e| OrphanError::file(&target_dir, e))?;

        let source = orphan.source_path();
        let target = target_dir.join(&orphan.filename);
        copy_preserving_metadata(&source, &target).await?;
        tracing::info!(
            source = %source.display(),
            target = %target.display(),
            "Copied recording into video storage"
        );

        let filespec = format!("{}/{}", subdir, orphan.filename);
        let mut matches = find_videos(&self.catalog_db, &host, &filespec).await?;
        if matches.is_empty() {
            if !self.catalog.register(&filespec, &host).await {
                return Err(OrphanError::Registration {
                    filespec,
                    host,
                });
            }
            matches = find_videos(&self.catalog_db, &host, &filespec).await?;
        } else {
            tracing::info!(filespec = %filespec, "Video already cataloged; updating record");
        }

        let mut video = match matches.len() {
            1 => matches.remove(0),
            n => {
                return Err(OrphanError::Consistency(format!(
                    "expected one catalog record for {} on {}, found {}",
                    filespec, host, n
                )))
            }
        };

        video.title = orphan.title.clone();
        video.subtitle = orphan.subtitle.clone();
        video.releasedate = Some(orphan.start_date);
        video.year = i64::from(orphan.start_date.year());
        video.length = orphan.duration;
        save_video(&self.catalog_db, &video).await?;

        if delete_source {
            tokio::fs::remove_file(&source)
                .await
                .map_err(|e| OrphanError::file(&source, e))?;
            delete_orphan(&self.pool, orphan.intid).await?;
            tracing::info!(file = %orphan.filename, "Removed promoted orphan");
        }

        tracing::info!(
            filespec = %filespec,
            host = %host,
            video_id = video.intid,
            "Orphan promoted"
        );

        Ok(video)
    }
}

/// Copy a file following symlinks, keeping permissions and access/modify times
async fn copy_preserving_metadata(source: &Path, target: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(source)
        .await
        .map_err(|e| OrphanError::file(source, e))?;

    // fs::copy carries permission bits across
    tokio::fs::copy(source, target)
        .await
        .map_err(|e| OrphanError::file(source, e))?;

    let accessed = metadata.accessed().map_err(|e| OrphanError::file(source, e))?;
    let modified = metadata.modified().map_err(|e| OrphanError::file(source, e))?;
    let target_path: PathBuf = target.to_path_buf();

    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let file = File::options().write(true).open(&target_path)?;
        file.set_times(FileTimes::new().set_accessed(accessed).set_modified(modified))
    })
    .await
    .map_err(|e| OrphanError::file(target, std::io::Error::other(e)))?
    .map_err(|e| OrphanError::file(target, e))?;

    Ok(())
}
