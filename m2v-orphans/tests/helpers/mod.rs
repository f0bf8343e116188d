//! Test Helper Utilities
//!
//! Shared setup for m2v-orphans integration tests
#![allow(dead_code)]

pub mod fake_backend;

pub use fake_backend::{create_catalog_database, BackendState, FakeBackend};

use chrono::{NaiveDate, NaiveTime};
use m2v_common::config::LoggingConfig;
use m2v_common::{ConfigSource, Settings};
use m2v_orphans::db::videos::CatalogDb;
use m2v_orphans::models::NewOrphan;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Host name the fake backend and the local host share
pub const BACKEND_HOST: &str = "127.0.0.1";

/// Scratch area for one test: orphan store, backend catalog database,
/// recordings, samples and videos dirs
pub struct TestEnv {
    pub temp_dir: TempDir,
    /// Orphan store
    pub pool: SqlitePool,
    /// Backend's catalog database, written by the fake `Video/AddVideo`
    pub catalog_db: SqlitePool,
    pub backend: FakeBackend,
    pub settings: Settings,
}

impl TestEnv {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for dir in ["recordings", "samples", "videos"] {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        }

        let database_path = root.join("m2v.db");
        let pool = m2v_common::db::init_database(&database_path).await.unwrap();
        let catalog_path = root.join("mythconverg.db");
        let catalog_db = create_catalog_database(&catalog_path).await;
        let backend = FakeBackend::start(catalog_db.clone()).await;

        let settings = Settings {
            mythbackend: BACKEND_HOST.to_string(),
            api_port: backend.port(),
            tv_recordings_dir: root.join("recordings"),
            recording_filename_pattern: "*.mpg".to_string(),
            video_samples_dir: root.join("samples"),
            preview_duration: 300,
            vidconverter: PathBuf::from("ffmpeg"),
            preview_quality: 5,
            database_path,
            local_hostname: BACKEND_HOST.to_string(),
            mythtv_database_url: Some(format!("sqlite://{}", catalog_path.display())),
            logging: LoggingConfig::default(),
            source: ConfigSource::Defaults,
        };

        Self {
            temp_dir,
            pool,
            catalog_db,
            backend,
            settings,
        }
    }

    /// Catalog database connection opened the way the CLI opens it
    pub async fn connect_catalog_db(&self) -> CatalogDb {
        let url = self.settings.mythtv_database_url.as_deref().unwrap();
        CatalogDb::connect(url).await.unwrap()
    }

    pub fn recordings_dir(&self) -> &Path {
        &self.settings.tv_recordings_dir
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.temp_dir.path().join("videos")
    }

    /// Write a recording file of `size` bytes (sparse where supported)
    pub fn write_recording(&self, filename: &str, size: u64) -> PathBuf {
        let path = self.recordings_dir().join(filename);
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(size).unwrap();
        path
    }
}

/// Orphan record with fixed, plausible attributes
pub fn sample_orphan(directory: &Path, filename: &str, filesize: i64) -> NewOrphan {
    NewOrphan {
        hostname: BACKEND_HOST.to_string(),
        title: String::new(),
        directory: directory.to_string_lossy().into_owned(),
        filename: filename.to_string(),
        filesize,
        duration: 20,
        start_date: NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
        start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        subtitle: String::new(),
        channel_id: "1008".to_string(),
        channel_number: 8,
        channel_name: "KQED".to_string(),
    }
}
