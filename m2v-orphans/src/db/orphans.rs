//! Orphan record store
//!
//! Plain read/insert/delete over the `orphans` table. The (hostname, filename)
//! uniqueness constraint is the only guard against duplicate inserts.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{OrphanError, Result};
use crate::models::{NewOrphan, Orphan};

const SELECT_COLUMNS: &str = r#"
    SELECT intid, hostname, title, directory, filename, filesize, duration,
           start_date, start_time, subtitle, channel_id, channel_number, channel_name
    FROM orphans
"#;

/// Count orphan records
pub async fn count_orphans(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orphans")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Load all orphans, oldest insert first
pub async fn load_all_orphans(pool: &SqlitePool) -> Result<Vec<Orphan>> {
    let sql = format!("{} ORDER BY intid", SELECT_COLUMNS);
    let orphans = sqlx::query_as::<_, Orphan>(&sql).fetch_all(pool).await?;
    Ok(orphans)
}

/// Load one orphan by id
pub async fn load_orphan(pool: &SqlitePool, intid: i64) -> Result<Option<Orphan>> {
    let sql = format!("{} WHERE intid = ?", SELECT_COLUMNS);
    let orphan = sqlx::query_as::<_, Orphan>(&sql)
        .bind(intid)
        .fetch_optional(pool)
        .await?;
    Ok(orphan)
}

/// Insert one orphan, returning its id
///
/// A second insert of the same (hostname, filename) fails with
/// [`OrphanError::Duplicate`].
pub async fn insert_orphan<'e, E>(executor: E, orphan: &NewOrphan) -> Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO orphans (hostname, title, directory, filename, filesize, duration,
                             start_date, start_time, subtitle, channel_id, channel_number,
                             channel_name)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&orphan.hostname)
    .bind(&orphan.title)
    .bind(&orphan.directory)
    .bind(&orphan.filename)
    .bind(orphan.filesize)
    .bind(orphan.duration)
    .bind(orphan.start_date)
    .bind(orphan.start_time)
    .bind(&orphan.subtitle)
    .bind(&orphan.channel_id)
    .bind(orphan.channel_number)
    .bind(&orphan.channel_name)
    .execute(executor)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            OrphanError::Duplicate {
                host: orphan.hostname.clone(),
                filename: orphan.filename.clone(),
            }
        }
        other => OrphanError::Database(other),
    })?;

    Ok(result.last_insert_rowid())
}

/// Commit a staged batch of orphans in one transaction
///
/// With `wipe` set, every existing orphan is deleted first. Either the whole
/// batch lands (after the wipe) or nothing changes.
pub async fn replace_orphans(pool: &SqlitePool, batch: &[NewOrphan], wipe: bool) -> Result<usize> {
    let mut tx = pool.begin().await?;

    if wipe {
        let deleted = sqlx::query("DELETE FROM orphans")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tracing::info!(deleted, "Cleared existing orphan records");
    }

    for orphan in batch {
        insert_orphan(&mut *tx, orphan).await?;
    }

    tx.commit().await?;
    Ok(batch.len())
}

/// Delete one orphan record; returns false if it did not exist
pub async fn delete_orphan(pool: &SqlitePool, intid: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM orphans WHERE intid = ?")
        .bind(intid)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Set an orphan's title and subtitle; returns false if it did not exist
pub async fn update_orphan_titles(
    pool: &SqlitePool,
    intid: i64,
    title: &str,
    subtitle: &str,
) -> Result<bool> {
    let result = sqlx::query("UPDATE orphans SET title = ?, subtitle = ? WHERE intid = ?")
        .bind(title)
        .bind(subtitle)
        .bind(intid)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
