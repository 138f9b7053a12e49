// model = "claude-opus-4-5"
// created = "2026-10-12"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! The replicated document.
//!
//! A document is a sorted vector of character entries plus the log of every
//! operation that produced them. Entries are never reordered: an insert
//! lands at the index found by binary search over positions, and a delete
//! only flips a flag. Deleted entries (tombstones) stay in place until
//! garbage collection removes them.
//!
//! # Delivery order
//!
//! Nothing here assumes causal delivery. Each case that could arrive "too
//! early" or "too late" has a defined outcome:
//!
//! | Arrival                          | Outcome                                |
//! |----------------------------------|----------------------------------------|
//! | same operation id again          | `Duplicate`, no change                 |
//! | insert at an occupied position   | `Duplicate`, no change                 |
//! | delete of a tombstone            | `Ignored`, logged                      |
//! | delete of a collected position   | `Ignored`, logged                      |
//! | delete before its insert         | `Deferred`, logged, remembered         |
//! | insert after its delete          | `Superseded`, stored as a tombstone    |
//!
//! The last two rows are what make out-of-order delivery converge: a
//! replica that saw insert-then-delete and one that saw delete-then-insert
//! both end with a tombstone.

use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::config::Config;
use crate::hash::Digest;
use crate::hash::StateHasher;
use super::Crdt;
use super::op::OpLog;
use super::op::Operation;
use super::position::Position;
use super::position::PositionError;
use super::primitives::clock::Timestamp;
use super::primitives::clock::VersionVector;

/// A character stored in the document, live or tombstoned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterEntry {
    pub character: char,
    pub position: Position,
    pub deleted: bool,
    /// Timestamp of the insert that created this entry.
    pub timestamp: Timestamp,
}

/// What `Document::apply` did with an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// A new live character.
    Inserted,
    /// A live character became a tombstone.
    Deleted,
    /// An insert whose delete arrived first; stored as a tombstone.
    Superseded,
    /// A delete whose insert has not arrived yet.
    Deferred,
    /// A delete of a tombstone or of a collected position.
    Ignored,
    /// Already applied.
    Duplicate,
}

impl Applied {
    /// Whether the visible text may have changed.
    pub fn changed_text(&self) -> bool {
        return matches!(self, Applied::Inserted | Applied::Deleted);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] PositionError),
    #[error("operation from {client_id:?} carries a timestamp from {timestamp_client:?}")]
    ClientMismatch { client_id: String, timestamp_client: String },
}

/// Full replica state, for bringing a new replica up to date.
///
/// Unlike the visible text, a snapshot keeps positions and the log, so the
/// receiving replica can keep editing and keep deduplicating.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: Vec<CharacterEntry>,
    pub operations: Vec<Operation>,
    pub pending: Vec<Position>,
    pub timestamp: Timestamp,
}

/// A replicated text document.
#[derive(Clone, Debug)]
pub struct Document {
    id: String,
    /// Sorted by position, always.
    entries: Vec<CharacterEntry>,
    log: OpLog,
    /// Tombstones currently stored in `entries`.
    deleted_count: usize,
    gc_threshold: Option<usize>,
    timestamp: Timestamp,
    version: VersionVector,
    /// Positions deleted before they were inserted.
    pending: FxHashSet<Position>,
}

impl Document {
    /// Create an empty document without automatic garbage collection.
    pub fn new(id: impl Into<String>) -> Document {
        return Document::with_config(id, &Config::default());
    }

    pub fn with_config(id: impl Into<String>, config: &Config) -> Document {
        let id = id.into();
        return Document {
            timestamp: Timestamp::new(id.clone()),
            id,
            entries: Vec::new(),
            log: OpLog::new(),
            deleted_count: 0,
            gc_threshold: config.gc_threshold,
            version: VersionVector::new(),
            pending: FxHashSet::default(),
        };
    }

    /// Rebuild a replica from another replica's snapshot.
    pub fn from_snapshot(id: impl Into<String>, snapshot: Snapshot, config: &Config) -> Result<Document, ApplyError> {
        for entry in &snapshot.entries {
            entry.position.check()?;
        }
        if snapshot.entries.windows(2).any(|pair| pair[0].position >= pair[1].position) {
            return Err(ApplyError::InvalidPosition(PositionError::NotOrdered));
        }

        let mut document = Document::with_config(id, config);
        for op in snapshot.operations {
            op.position().check()?;
            document.version.observe(op.timestamp());
            document.log.push(op);
        }
        document.deleted_count = snapshot.entries.iter().filter(|entry| entry.deleted).count();
        document.entries = snapshot.entries;
        document.pending = snapshot.pending.into_iter().collect();
        document.timestamp.merge(&snapshot.timestamp);

        debug!(doc = %document.id, entries = document.entries.len(), ops = document.log.len(), "restored from snapshot");
        return Ok(document);
    }

    pub fn id(&self) -> &str {
        return &self.id;
    }

    /// Apply a local or remote operation.
    ///
    /// Either fails validation without touching the document, or succeeds,
    /// possibly as a no-op. See the module docs for every outcome.
    pub fn apply(&mut self, op: Operation) -> Result<Applied, ApplyError> {
        if let Err(err) = op.position().check() {
            warn!(doc = %self.id, client = op.client_id(), %err, "rejected operation");
            return Err(err.into());
        }
        if op.client_id() != op.timestamp().client_id() {
            warn!(doc = %self.id, client = op.client_id(), "rejected operation with foreign timestamp");
            return Err(ApplyError::ClientMismatch {
                client_id: op.client_id().to_string(),
                timestamp_client: op.timestamp().client_id().to_string(),
            });
        }
        if self.log.contains(&op.id()) {
            trace!(doc = %self.id, client = op.client_id(), counter = op.timestamp().counter(), "duplicate delivery");
            return Ok(Applied::Duplicate);
        }

        let applied = match &op {
            Operation::Insert { character, position, timestamp, .. } => {
                let index = match self.search(position) {
                    Ok(_) => {
                        trace!(doc = %self.id, ?position, "position already occupied");
                        return Ok(Applied::Duplicate);
                    }
                    Err(index) => index,
                };
                let deleted = self.pending.remove(position);
                self.entries.insert(index, CharacterEntry {
                    character: *character,
                    position: position.clone(),
                    deleted,
                    timestamp: timestamp.clone(),
                });
                if deleted {
                    self.deleted_count += 1;
                    Applied::Superseded
                } else {
                    Applied::Inserted
                }
            }
            Operation::Delete { position, .. } => match self.search(position) {
                Ok(index) => {
                    let entry = &mut self.entries[index];
                    if entry.deleted {
                        Applied::Ignored
                    } else {
                        entry.deleted = true;
                        self.deleted_count += 1;
                        Applied::Deleted
                    }
                }
                Err(_) => {
                    if self.log.inserted(position) {
                        Applied::Ignored
                    } else {
                        self.pending.insert(position.clone());
                        Applied::Deferred
                    }
                }
            },
        };

        self.timestamp.update(op.timestamp());
        self.version.observe(op.timestamp());
        trace!(doc = %self.id, client = op.client_id(), ?applied, "applied operation");
        self.log.push(op);

        if matches!(applied, Applied::Deleted | Applied::Superseded) {
            self.collect_if_due();
        }
        return Ok(applied);
    }

    fn search(&self, position: &Position) -> Result<usize, usize> {
        return self.entries.binary_search_by(|entry| entry.position.cmp(position));
    }

    fn collect_if_due(&mut self) {
        if let Some(threshold) = self.gc_threshold {
            if self.deleted_count >= threshold {
                self.collect_garbage();
            }
        }
    }

    /// Remove every tombstone. Returns how many were removed.
    ///
    /// The log is kept, so a late delete for a collected position is still
    /// recognised and ignored.
    pub fn collect_garbage(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.deleted);
        let removed = before - self.entries.len();
        self.deleted_count = 0;
        debug!(doc = %self.id, removed, remaining = self.entries.len(), "collected garbage");
        return removed;
    }

    /// Set the tombstone count that triggers collection. `None` disables
    /// automatic collection; `collect_garbage` still works.
    pub fn set_garbage_collection_threshold(&mut self, threshold: Option<usize>) {
        self.gc_threshold = threshold;
    }

    pub fn gc_threshold(&self) -> Option<usize> {
        return self.gc_threshold;
    }

    /// The visible text, in position order.
    pub fn visible_text(&self) -> String {
        return self.live().map(|entry| entry.character).collect();
    }

    /// The visible characters, in position order.
    pub fn visible_chars(&self) -> Vec<char> {
        return self.live().map(|entry| entry.character).collect();
    }

    fn live(&self) -> impl Iterator<Item = &CharacterEntry> {
        return self.entries.iter().filter(|entry| !entry.deleted);
    }

    /// Number of visible characters.
    pub fn len(&self) -> usize {
        return self.entries.len() - self.deleted_count;
    }

    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Number of stored entries, tombstones included.
    pub fn entry_count(&self) -> usize {
        return self.entries.len();
    }

    pub fn deleted_count(&self) -> usize {
        return self.deleted_count;
    }

    pub fn entries(&self) -> &[CharacterEntry] {
        return &self.entries;
    }

    /// Every accepted operation, in arrival order.
    pub fn operations(&self) -> &[Operation] {
        return self.log.ops();
    }

    /// Operations a replica at `version` has not seen.
    pub fn operations_since<'a>(&'a self, version: &'a VersionVector) -> impl Iterator<Item = &'a Operation> + 'a {
        return self.log.since(version);
    }

    /// The document's Lamport clock.
    pub fn timestamp(&self) -> &Timestamp {
        return &self.timestamp;
    }

    pub fn version(&self) -> &VersionVector {
        return &self.version;
    }

    /// Deletes waiting for their insert.
    pub fn pending_deletes(&self) -> usize {
        return self.pending.len();
    }

    /// Position of the visible character at `index`.
    pub fn position_at(&self, index: usize) -> Option<&Position> {
        return self.live().nth(index).map(|entry| &entry.position);
    }

    /// The stored neighbours around visible index `index`, for allocating a
    /// new position there. `index == len()` means the end.
    ///
    /// Tombstones count as neighbours, so the new position never equals one.
    pub fn gap(&self, index: usize) -> Option<(Position, Position)> {
        if index > self.len() {
            return None;
        }
        let slot = self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.deleted)
            .nth(index)
            .map(|(slot, _)| slot)
            .unwrap_or(self.entries.len());

        let lo = match slot {
            0 => Position::start(),
            _ => self.entries[slot - 1].position.clone(),
        };
        let hi = match self.entries.get(slot) {
            Some(entry) => entry.position.clone(),
            None => Position::end(),
        };
        return Some((lo, hi));
    }

    /// Digest of the visible state. Equal on converged replicas, whatever
    /// their tombstones or log order.
    pub fn digest(&self) -> Digest {
        let mut hasher = StateHasher::new();
        for entry in self.live() {
            hasher.entry(entry.position.path(), entry.character);
        }
        return hasher.finish();
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut pending: Vec<Position> = self.pending.iter().cloned().collect();
        pending.sort();
        return Snapshot {
            entries: self.entries.clone(),
            operations: self.log.ops().to_vec(),
            pending,
            timestamp: self.timestamp.clone(),
        };
    }
}

impl Crdt for Document {
    /// Replay every operation of `other` that this replica lacks.
    fn merge(&mut self, other: &Self) {
        let missing: Vec<Operation> = other
            .operations()
            .iter()
            .filter(|op| !self.log.contains(&op.id()))
            .cloned()
            .collect();

        for op in missing {
            if let Err(err) = self.apply(op) {
                warn!(doc = %self.id, %err, "skipped operation during merge");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(path: &[u32]) -> Position {
        return Position::from_path(path).unwrap();
    }

    fn insert(client: &str, counter: u64, character: char, path: &[u32]) -> Operation {
        return Operation::insert(character, pos(path), Timestamp::with_counter(client, counter));
    }

    fn delete(client: &str, counter: u64, path: &[u32]) -> Operation {
        return Operation::delete(pos(path), Timestamp::with_counter(client, counter));
    }

    /// "Hello" at [10], [20], ... [50], all from alice.
    fn hello() -> Document {
        let mut doc = Document::new("doc");
        for (i, c) in "Hello".chars().enumerate() {
            let n = i as u32 + 1;
            doc.apply(insert("alice", n as u64, c, &[n * 10])).unwrap();
        }
        return doc;
    }

    #[test]
    fn new_document_is_empty() {
        let doc = Document::new("doc");
        assert_eq!(doc.id(), "doc");
        assert_eq!(doc.visible_text(), "");
        assert!(doc.operations().is_empty());
        assert_eq!(doc.deleted_count(), 0);
        assert_eq!(doc.gc_threshold(), None);
        assert_eq!(doc.timestamp().counter(), 0);
        assert!(doc.is_empty());
    }

    #[test]
    fn inserts_are_ordered_by_position() {
        let mut doc = Document::new("doc");
        doc.apply(insert("alice", 1, 'c', &[30])).unwrap();
        doc.apply(insert("alice", 2, 'a', &[10])).unwrap();
        doc.apply(insert("alice", 3, 'b', &[20])).unwrap();

        assert_eq!(doc.visible_text(), "abc");
        assert_eq!(doc.visible_chars(), vec!['a', 'b', 'c']);
        assert!(doc.entries().windows(2).all(|w| w[0].position < w[1].position));
    }

    #[test]
    fn delete_marks_tombstone() {
        let mut doc = hello();
        assert_eq!(doc.apply(delete("alice", 6, &[30])).unwrap(), Applied::Deleted);
        assert_eq!(doc.apply(delete("alice", 7, &[40])).unwrap(), Applied::Deleted);

        assert_eq!(doc.visible_text(), "Heo");
        assert_eq!(doc.entry_count(), 5);
        assert_eq!(doc.deleted_count(), 2);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn second_delete_of_same_character_is_ignored() {
        let mut doc = hello();
        doc.apply(delete("alice", 6, &[30])).unwrap();
        assert_eq!(doc.apply(delete("bob", 1, &[30])).unwrap(), Applied::Ignored);
        assert_eq!(doc.deleted_count(), 1);
        assert_eq!(doc.operations().len(), 7);
    }

    #[test]
    fn duplicate_operation_changes_nothing() {
        let mut doc = hello();
        let before = doc.visible_text();
        let ops = doc.operations().len();

        assert_eq!(doc.apply(insert("alice", 1, 'H', &[10])).unwrap(), Applied::Duplicate);
        assert_eq!(doc.visible_text(), before);
        assert_eq!(doc.operations().len(), ops);
    }

    #[test]
    fn insert_at_occupied_position_is_duplicate() {
        let mut doc = hello();
        assert_eq!(doc.apply(insert("bob", 9, 'X', &[10])).unwrap(), Applied::Duplicate);
        assert_eq!(doc.visible_text(), "Hello");
        assert_eq!(doc.operations().len(), 5);
    }

    #[test]
    fn rejects_sentinel_positions() {
        let mut doc = hello();
        let op = Operation::insert('x', Position::start(), Timestamp::with_counter("bob", 1));
        assert_eq!(doc.apply(op), Err(ApplyError::InvalidPosition(PositionError::Sentinel)));

        let op = Operation::delete(Position::end(), Timestamp::with_counter("bob", 1));
        assert!(doc.apply(op).is_err());
        assert_eq!(doc.operations().len(), 5);
        assert_eq!(doc.timestamp().counter(), 6);
    }

    #[test]
    fn rejects_foreign_timestamp() {
        let mut doc = Document::new("doc");
        let op = Operation::Insert {
            client_id: "mallory".to_string(),
            character: 'x',
            position: pos(&[5]),
            timestamp: Timestamp::with_counter("alice", 1),
        };
        assert!(matches!(doc.apply(op), Err(ApplyError::ClientMismatch { .. })));
        assert!(doc.is_empty());
        assert!(doc.operations().is_empty());
    }

    #[test]
    fn apply_advances_clock() {
        let mut doc = Document::new("doc");
        doc.apply(insert("alice", 7, 'a', &[1])).unwrap();
        assert_eq!(doc.timestamp().counter(), 8);
        assert_eq!(doc.version().get("alice"), 7);

        doc.apply(insert("bob", 2, 'b', &[2])).unwrap();
        assert_eq!(doc.timestamp().counter(), 9);
        assert_eq!(doc.version().get("bob"), 2);
    }

    #[test]
    fn delete_before_insert_is_deferred() {
        let mut doc = Document::new("doc");
        assert_eq!(doc.apply(delete("bob", 2, &[5])).unwrap(), Applied::Deferred);
        assert_eq!(doc.pending_deletes(), 1);
        assert_eq!(doc.operations().len(), 1);

        assert_eq!(doc.apply(insert("alice", 1, 'x', &[5])).unwrap(), Applied::Superseded);
        assert_eq!(doc.visible_text(), "");
        assert_eq!(doc.deleted_count(), 1);
        assert_eq!(doc.pending_deletes(), 0);
    }

    #[test]
    fn delete_after_collection_is_ignored() {
        let mut doc = hello();
        doc.apply(delete("alice", 6, &[10])).unwrap();
        assert_eq!(doc.collect_garbage(), 1);

        assert_eq!(doc.apply(delete("bob", 1, &[10])).unwrap(), Applied::Ignored);
        assert_eq!(doc.pending_deletes(), 0);
        assert_eq!(doc.visible_text(), "ello");
    }

    #[test]
    fn redelivered_insert_after_collection_stays_gone() {
        let mut doc = hello();
        doc.apply(delete("alice", 6, &[10])).unwrap();
        doc.collect_garbage();

        assert_eq!(doc.apply(insert("alice", 1, 'H', &[10])).unwrap(), Applied::Duplicate);
        assert_eq!(doc.visible_text(), "ello");
    }

    #[test]
    fn collect_garbage_keeps_text_and_log() {
        let mut doc = hello();
        doc.apply(delete("alice", 6, &[30])).unwrap();
        doc.apply(delete("alice", 7, &[40])).unwrap();

        let before = doc.visible_text();
        assert_eq!(doc.collect_garbage(), 2);
        assert_eq!(doc.visible_text(), before);
        assert_eq!(doc.entry_count(), 3);
        assert_eq!(doc.deleted_count(), 0);
        assert_eq!(doc.operations().len(), 7);
    }

    #[test]
    fn threshold_triggers_collection() {
        let mut doc = hello();
        doc.set_garbage_collection_threshold(Some(3));

        doc.apply(delete("alice", 6, &[10])).unwrap();
        assert_eq!(doc.entry_count(), 5);
        doc.apply(delete("alice", 7, &[20])).unwrap();
        assert_eq!(doc.entry_count(), 5);
        doc.apply(delete("alice", 8, &[30])).unwrap();

        assert_eq!(doc.entry_count(), 2);
        assert_eq!(doc.deleted_count(), 0);
        assert!(doc.entries().iter().all(|entry| !entry.deleted));
        assert_eq!(doc.visible_text(), "lo");
    }

    #[test]
    fn disabling_threshold_stops_collection() {
        let mut doc = Document::with_config("doc", &Config::default().with_gc_threshold(Some(1)));
        doc.set_garbage_collection_threshold(None);
        doc.apply(delete("alice", 6, &[10])).unwrap();
        assert_eq!(doc.entry_count(), 5);
    }

    #[test]
    fn gap_skips_to_neighbouring_entries() {
        let mut doc = hello();
        doc.apply(delete("alice", 6, &[20])).unwrap(); // "Hllo"

        assert_eq!(doc.gap(0), Some((Position::start(), pos(&[10]))));
        // Between 'H' and the first 'l' sits the tombstone for 'e'.
        assert_eq!(doc.gap(1), Some((pos(&[20]), pos(&[30]))));
        assert_eq!(doc.gap(4), Some((pos(&[50]), Position::end())));
        assert_eq!(doc.gap(5), None);
    }

    #[test]
    fn position_at_counts_visible_characters() {
        let mut doc = hello();
        doc.apply(delete("alice", 6, &[10])).unwrap();
        assert_eq!(doc.position_at(0), Some(&pos(&[20])));
        assert_eq!(doc.position_at(4), None);
    }

    #[test]
    fn snapshot_restores_state() {
        let mut doc = hello();
        doc.apply(delete("alice", 6, &[20])).unwrap();
        doc.apply(delete("bob", 1, &[99])).unwrap();

        let restored = Document::from_snapshot("copy", doc.snapshot(), &Config::default()).unwrap();
        assert_eq!(restored.visible_text(), "Hllo");
        assert_eq!(restored.deleted_count(), 1);
        assert_eq!(restored.pending_deletes(), 1);
        assert_eq!(restored.operations().len(), doc.operations().len());
        assert_eq!(restored.digest(), doc.digest());
        assert_eq!(restored.version(), doc.version());
    }

    #[test]
    fn snapshot_rejects_unsorted_entries() {
        let mut snapshot = hello().snapshot();
        snapshot.entries.swap(0, 1);
        let result = Document::from_snapshot("copy", snapshot, &Config::default());
        assert!(matches!(result, Err(ApplyError::InvalidPosition(PositionError::NotOrdered))));
    }

    #[test]
    fn digest_ignores_tombstones() {
        let mut a = hello();
        let mut b = hello();
        a.apply(delete("alice", 6, &[20])).unwrap();
        b.apply(delete("alice", 6, &[20])).unwrap();
        b.collect_garbage();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), hello().digest());
    }

    #[test]
    fn merge_replays_missing_operations() {
        let mut a = Document::new("a");
        let mut b = Document::new("b");
        a.apply(insert("alice", 1, 'x', &[10])).unwrap();
        b.apply(insert("bob", 1, 'y', &[20])).unwrap();
        b.apply(delete("bob", 2, &[10])).unwrap(); // before b has seen 'x'

        a.merge(&b);
        b.merge(&a);

        assert_eq!(a.visible_text(), "y");
        assert_eq!(b.visible_text(), "y");
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn merge_fills_counter_gaps() {
        let mut source = Document::new("source");
        source.apply(insert("alice", 1, 'a', &[10])).unwrap();
        source.apply(insert("alice", 2, 'b', &[20])).unwrap();

        let mut target = Document::new("target");
        target.apply(insert("alice", 2, 'b', &[20])).unwrap();

        target.merge(&source);
        assert_eq!(target.visible_text(), "ab");
    }
}
