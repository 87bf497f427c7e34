//! # Record Providers
//!
//! The evaluator talks to the MPD database through the [`RecordProvider`]
//! trait, so front-ends can plug in whatever backs their library: the real
//! daemon, a cached snapshot, or an in-memory fixture.
//!
//! Two implementations live here:
//!
//! - [`MpcProvider`] shells out to the `mpc` command-line client, the same way
//!   the rest of the desktop tooling integrates with MPD. Using mpc instead of
//!   speaking the protocol directly keeps connection management, reconnection
//!   and protocol framing out of this crate entirely.
//! - [`MemoryProvider`] serves records from a `Vec` and backs the test suite
//!   and embedding front-ends that already hold their library in memory.
//!
//! Provider failures are a distinct error kind ([`ProviderError`]); nothing in
//! this crate retries them. Retry and backoff policy belongs to the caller.

use crate::ast::CompareOp;
use crate::record::Record;
use log::{debug, trace};
use std::process::Command;
use thiserror::Error;

/// Failure talking to the record provider. Surfaced to callers as-is.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider is unreachable (MPD down, mpc missing, connection lost).
    #[error("cannot reach MPD: {0}")]
    Unavailable(String),
    /// The provider answered with something we cannot interpret.
    #[error("unexpected response from MPD: {0}")]
    Protocol(String),
    #[error("I/O error talking to MPD: {0}")]
    Io(#[from] std::io::Error),
}

/// Database statistics, used for snapshot staleness checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStats {
    /// Opaque last-database-update stamp. Compared for equality only.
    pub db_update: String,
    pub songs: u64,
}

/// A song on the current play queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSong {
    pub id: u64,
    pub file: String,
}

/// The operations the query core needs from an MPD-like backend.
pub trait RecordProvider {
    /// Records whose `tag` exactly equals `value`. `tag` may be `any`.
    fn find(&self, tag: &str, value: &str) -> Result<Vec<Record>, ProviderError>;

    /// Records whose `tag` contains `value`, case-insensitively. `tag` may be
    /// `any`.
    fn search(&self, tag: &str, value: &str) -> Result<Vec<Record>, ProviderError>;

    fn stats(&self) -> Result<DbStats, ProviderError>;

    /// Full database snapshot, in database order.
    fn list_all(&self) -> Result<Vec<Record>, ProviderError>;

    /// Play-queue entries whose `tag` exactly equals `value`.
    fn playlist_find(&self, tag: &str, value: &str) -> Result<Vec<QueueSong>, ProviderError>;

    /// Append `file` to the play queue, returning its queue id.
    fn add_id(&mut self, file: &str) -> Result<u64, ProviderError>;
}

/// In-memory provider over a fixed record set.
///
/// Lookup semantics mirror the evaluator's comparison semantics exactly, so
/// linear-scan and indexed evaluation agree on fixtures built from this type.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    records: Vec<Record>,
    queue: Vec<QueueSong>,
    next_id: u64,
    db_update: String,
}

impl MemoryProvider {
    pub fn new(records: Vec<Record>) -> MemoryProvider {
        MemoryProvider {
            records,
            queue: Vec::new(),
            next_id: 1,
            db_update: "1".into(),
        }
    }

    /// Bump the database-update stamp, as an MPD rescan would.
    pub fn touch_db(&mut self, stamp: impl Into<String>) {
        self.db_update = stamp.into();
    }

    pub fn queue(&self) -> &[QueueSong] {
        &self.queue
    }

    fn lookup(&self, tag: &str, value: &str, op: CompareOp) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| {
                if tag.eq_ignore_ascii_case("any") {
                    record.tags().any(|(_, v)| op.matches(value, &v.coerce()))
                } else {
                    record
                        .get(tag)
                        .map(|v| op.matches(value, &v.coerce()))
                        .unwrap_or(false)
                }
            })
            .cloned()
            .collect()
    }
}

impl RecordProvider for MemoryProvider {
    fn find(&self, tag: &str, value: &str) -> Result<Vec<Record>, ProviderError> {
        Ok(self.lookup(tag, value, CompareOp::Exact))
    }

    fn search(&self, tag: &str, value: &str) -> Result<Vec<Record>, ProviderError> {
        Ok(self.lookup(tag, value, CompareOp::Like))
    }

    fn stats(&self) -> Result<DbStats, ProviderError> {
        Ok(DbStats {
            db_update: self.db_update.clone(),
            songs: self.records.len() as u64,
        })
    }

    fn list_all(&self) -> Result<Vec<Record>, ProviderError> {
        Ok(self.records.clone())
    }

    fn playlist_find(&self, tag: &str, value: &str) -> Result<Vec<QueueSong>, ProviderError> {
        if !tag.eq_ignore_ascii_case("file") {
            return Ok(Vec::new());
        }
        Ok(self
            .queue
            .iter()
            .filter(|song| song.file == value)
            .cloned()
            .collect())
    }

    fn add_id(&mut self, file: &str) -> Result<u64, ProviderError> {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.push(QueueSong {
            id,
            file: file.into(),
        });
        Ok(id)
    }
}

/// Tags requested from mpc, in column order. `file` must stay first.
const FORMAT_TAGS: &[&str] = &[
    "file",
    "artist",
    "albumartist",
    "album",
    "title",
    "track",
    "genre",
    "date",
    "composer",
    "performer",
];

/// Provider backed by the `mpc` command-line client.
///
/// Host and port come from `MPD_HOST`/`MPD_PORT`, which mpc reads natively;
/// they are threaded through explicitly so a caller can override them without
/// touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct MpcProvider {
    host: Option<String>,
    port: Option<String>,
}

impl MpcProvider {
    pub fn new(host: Option<String>, port: Option<String>) -> MpcProvider {
        MpcProvider { host, port }
    }

    /// Read `MPD_HOST`/`MPD_PORT` from the environment.
    pub fn from_env() -> MpcProvider {
        MpcProvider {
            host: std::env::var("MPD_HOST").ok(),
            port: std::env::var("MPD_PORT").ok(),
        }
    }

    /// Verify MPD is reachable by running `mpc version`.
    pub fn check_connection(&self) -> Result<(), ProviderError> {
        self.run(&["version"]).map(drop)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("mpc");
        if let Some(host) = &self.host {
            cmd.env("MPD_HOST", host);
        }
        if let Some(port) = &self.port {
            cmd.env("MPD_PORT", port);
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<String, ProviderError> {
        trace!("running mpc {args:?}");
        let output = self.command().args(args).output().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ProviderError::Unavailable(
                    "mpc not found; install the mpc MPD client".to_string(),
                )
            } else {
                ProviderError::Io(err)
            }
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Unavailable(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn format_string() -> String {
        FORMAT_TAGS
            .iter()
            .map(|tag| format!("%{tag}%"))
            .collect::<Vec<_>>()
            .join("\t")
    }

    /// Parse tab-separated `--format` output into records, skipping lines
    /// without a file column.
    fn parse_records(output: &str) -> Vec<Record> {
        let mut records = Vec::new();
        for line in output.lines() {
            if line.is_empty() {
                continue;
            }
            let mut record = Record::new();
            for (tag, value) in FORMAT_TAGS.iter().zip(line.split('\t')) {
                if !value.is_empty() {
                    record.push(tag, value);
                }
            }
            if record.file().is_some() {
                records.push(record);
            }
        }
        records
    }

    fn parse_stats(output: &str) -> Result<DbStats, ProviderError> {
        let mut db_update = None;
        let mut songs = 0;
        for line in output.lines() {
            if let Some(rest) = line.strip_prefix("DB Updated:") {
                db_update = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("Songs:") {
                songs = rest.trim().parse().unwrap_or(0);
            }
        }
        let db_update = db_update
            .ok_or_else(|| ProviderError::Protocol("mpc stats output has no DB Updated line".into()))?;
        Ok(DbStats { db_update, songs })
    }
}

impl RecordProvider for MpcProvider {
    fn find(&self, tag: &str, value: &str) -> Result<Vec<Record>, ProviderError> {
        let format = Self::format_string();
        let output = self.run(&["--format", format.as_str(), "find", tag, value])?;
        Ok(Self::parse_records(&output))
    }

    fn search(&self, tag: &str, value: &str) -> Result<Vec<Record>, ProviderError> {
        let format = Self::format_string();
        let output = self.run(&["--format", format.as_str(), "search", tag, value])?;
        Ok(Self::parse_records(&output))
    }

    fn stats(&self) -> Result<DbStats, ProviderError> {
        let output = self.run(&["stats"])?;
        Self::parse_stats(&output)
    }

    fn list_all(&self) -> Result<Vec<Record>, ProviderError> {
        let format = Self::format_string();
        debug!("loading full database snapshot from MPD");
        let output = self.run(&["--format", format.as_str(), "listall"])?;
        Ok(Self::parse_records(&output))
    }

    fn playlist_find(&self, tag: &str, value: &str) -> Result<Vec<QueueSong>, ProviderError> {
        // mpc has no playlistfind; list the queue with positions and filter.
        // Queue ids are therefore 1-based positions, which is what every mpc
        // command that takes a queue argument expects anyway.
        if !tag.eq_ignore_ascii_case("file") {
            return Ok(Vec::new());
        }
        let output = self.run(&["--format", "%position%\t%file%", "playlist"])?;
        let mut songs = Vec::new();
        for line in output.lines() {
            let Some((position, file)) = line.split_once('\t') else {
                continue;
            };
            if file == value {
                let id = position.trim().parse().map_err(|_| {
                    ProviderError::Protocol(format!("bad queue position `{position}`"))
                })?;
                songs.push(QueueSong {
                    id,
                    file: file.to_string(),
                });
            }
        }
        Ok(songs)
    }

    fn add_id(&mut self, file: &str) -> Result<u64, ProviderError> {
        self.run(&["add", file])?;
        let added = self.playlist_find("file", file)?;
        added
            .last()
            .map(|song| song.id)
            .ok_or_else(|| ProviderError::Protocol(format!("`{file}` missing from queue after add")))
    }
}
