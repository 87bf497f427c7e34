//! # Snapshot Cache
//!
//! The linear-scan strategy wants the whole MPD database in memory, and
//! loading it over the socket on every invocation is the slowest part of a
//! search. This module keeps the last snapshot in a small `SQLite` database
//! and only goes back to MPD when its `DB Updated` stamp moves.
//!
//! The cache is strictly disposable: unreadable, malformed or stale state
//! triggers an unconditional full reload from the provider and a rewrite of
//! the cache file. No cache condition is ever fatal; only the provider itself
//! failing is.

use crate::provider::{ProviderError, RecordProvider};
use crate::record::Record;
use anyhow::{Context, Result};
use log::{debug, warn};
use rusqlite::Connection;
use std::path::Path;

/// Load the full record snapshot, from cache when fresh, from the provider
/// otherwise.
///
/// Record order is stable across cache hits and reloads: provider database
/// order, which the scan strategy reports results in.
pub fn load<P: RecordProvider + ?Sized>(path: &Path, provider: &P) -> Result<Vec<Record>, ProviderError> {
    let stats = provider.stats()?;

    match read(path, &stats.db_update) {
        Ok(Some(records)) => {
            debug!("snapshot cache hit: {} records", records.len());
            return Ok(records);
        }
        Ok(None) => debug!("snapshot cache stale or absent, reloading from MPD"),
        Err(err) => warn!("snapshot cache unreadable ({err:#}), reloading from MPD"),
    }

    let records = provider.list_all()?;
    if let Err(err) = write(path, &stats.db_update, &records) {
        // A read-only cache dir degrades to reloading every run.
        warn!("could not write snapshot cache at {}: {err:#}", path.display());
    }
    Ok(records)
}

/// Read the cached snapshot if it exists and matches `db_update`.
fn read(path: &Path, db_update: &str) -> Result<Option<Vec<Record>>> {
    if !path.exists() {
        return Ok(None);
    }

    let conn = Connection::open(path)
        .with_context(|| format!("cannot open snapshot cache at {}", path.display()))?;

    let stored: String = conn
        .query_row("SELECT value FROM meta WHERE key = 'db_update'", [], |row| {
            row.get(0)
        })
        .context("snapshot cache has no db_update stamp")?;
    if stored != db_update {
        debug!("snapshot cache stamp `{stored}` != MPD stamp `{db_update}`");
        return Ok(None);
    }

    let mut stmt = conn
        .prepare("SELECT file, name, value FROM tag ORDER BY rowid")
        .context("snapshot cache has no tag table")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .context("cannot query snapshot cache")?;

    // Rows were written file-by-file, so grouping on consecutive file values
    // reassembles records in their original order.
    let mut records: Vec<Record> = Vec::new();
    let mut current_file: Option<String> = None;
    for row in rows {
        let (file, name, value) = row.context("corrupt row in snapshot cache")?;
        if current_file.as_deref() != Some(file.as_str()) {
            records.push(Record::new());
            current_file = Some(file);
        }
        if let Some(record) = records.last_mut() {
            record.push(&name, value);
        }
    }
    Ok(Some(records))
}

/// Rewrite the cache with a fresh snapshot in one transaction. The old file
/// is removed first, so even a non-SQLite garbage file gets replaced.
fn write(path: &Path, db_update: &str, records: &[Record]) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create cache directory {}", dir.display()))?;
    }
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("cannot remove old snapshot cache {}", path.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("cannot open snapshot cache at {}", path.display()))?;

    let tx = conn.transaction().context("cannot begin cache transaction")?;
    tx.execute_batch(
        "DROP TABLE IF EXISTS meta;
         DROP TABLE IF EXISTS tag;
         CREATE TABLE meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);
         CREATE TABLE tag (
             file  TEXT NOT NULL,
             name  TEXT NOT NULL,
             value TEXT NOT NULL
         );",
    )
    .context("cannot create snapshot cache schema")?;

    {
        let mut stmt = tx
            .prepare("INSERT INTO tag (file, name, value) VALUES (?1, ?2, ?3)")
            .context("cannot prepare cache insert")?;
        for record in records {
            let Some(file) = record.file() else {
                continue;
            };
            for (name, value) in record.tags() {
                match value {
                    crate::record::TagValue::One(v) => {
                        stmt.execute((file, name, v))
                            .context("cannot insert cache row")?;
                    }
                    crate::record::TagValue::Many(vs) => {
                        for v in vs {
                            stmt.execute((file, name, v))
                                .context("cannot insert cache row")?;
                        }
                    }
                }
            }
        }
    }
    tx.execute(
        "INSERT INTO meta (key, value) VALUES ('db_update', ?1)",
        [db_update],
    )
    .context("cannot store db_update stamp")?;
    tx.commit().context("committing cache transaction failed")?;

    debug!("snapshot cache rewritten: {} records", records.len());
    Ok(())
}
