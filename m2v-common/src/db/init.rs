//! Database initialization
//!
//! Opens (creating if needed) the SQLite orphan store and its `orphans`
//! table: recording files the backend no longer knows about. The backend's
//! `videometadata` catalog lives in its own database and is not created here.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    // Idempotent - safe to call on every start
    create_orphans_table(&pool).await?;

    Ok(pool)
}

/// Create the orphans table
///
/// (hostname, filename) is unique; inserting a duplicate is a constraint
/// violation.
pub async fn create_orphans_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orphans (
            intid INTEGER PRIMARY KEY AUTOINCREMENT,
            hostname TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            directory TEXT NOT NULL,
            filename TEXT NOT NULL,
            filesize INTEGER NOT NULL DEFAULT 0,
            duration INTEGER NOT NULL DEFAULT 0,
            start_date DATE NOT NULL,
            start_time TIME NOT NULL,
            subtitle TEXT NOT NULL DEFAULT '',
            channel_id TEXT NOT NULL,
            channel_number INTEGER NOT NULL,
            channel_name TEXT NOT NULL,
            UNIQUE (hostname, filename)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
