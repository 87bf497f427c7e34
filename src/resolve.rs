//! Mapping search results onto the current play queue.
//!
//! This is the one place the query toolkit mutates anything: a result that is
//! not on the queue yet gets enqueued. Callers opt in explicitly (the CLI's
//! `--add` flag); plain evaluation never touches the queue.

use crate::provider::{ProviderError, RecordProvider};
use crate::record::Record;
use log::debug;
use serde::Serialize;

/// A search result resolved against the play queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    /// Queue id of the song (existing or freshly assigned).
    pub id: u64,
    /// True when the song was enqueued by this resolution.
    pub added: bool,
    #[serde(flatten)]
    pub record: Record,
}

/// Attach a queue id to each record, enqueuing songs not already queued.
///
/// A record already on the queue (matched by file) keeps its existing id and
/// is marked `added: false`; anything else is appended via the provider and
/// marked `added: true`. Records without a file are skipped outright, though
/// evaluation never produces one.
pub fn resolve_ids<P: RecordProvider + ?Sized>(
    records: Vec<Record>,
    provider: &mut P,
) -> Result<Vec<QueueEntry>, ProviderError> {
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let Some(file) = record.file().map(str::to_string) else {
            continue;
        };
        let existing = provider.playlist_find("file", &file)?;
        let entry = match existing.first() {
            Some(song) => QueueEntry {
                id: song.id,
                added: false,
                record,
            },
            None => {
                debug!("enqueuing {file}");
                let id = provider.add_id(&file)?;
                QueueEntry {
                    id,
                    added: true,
                    record,
                }
            }
        };
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryProvider;

    #[test]
    fn enqueues_missing_and_keeps_existing() {
        let mut provider = MemoryProvider::new(Vec::new());
        provider.add_id("a.mp3").unwrap();

        let results = vec![
            Record::from_pairs(&[("file", "a.mp3")]),
            Record::from_pairs(&[("file", "b.mp3")]),
        ];
        let entries = resolve_ids(results, &mut provider).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, 1);
        assert!(!entries[0].added);
        assert_eq!(entries[1].id, 2);
        assert!(entries[1].added);
        assert_eq!(provider.queue().len(), 2);
    }

    #[test]
    fn resolving_twice_does_not_duplicate() {
        let mut provider = MemoryProvider::new(Vec::new());
        let results = vec![Record::from_pairs(&[("file", "a.mp3")])];

        let first = resolve_ids(results.clone(), &mut provider).unwrap();
        let second = resolve_ids(results, &mut provider).unwrap();

        assert!(first[0].added);
        assert!(!second[0].added);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(provider.queue().len(), 1);
    }

    #[test]
    fn queue_entry_serializes_flat() {
        let entry = QueueEntry {
            id: 3,
            added: true,
            record: Record::from_pairs(&[("file", "a.mp3")]),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["added"], true);
        assert_eq!(json["file"], "a.mp3");
    }
}
