// model = "claude-opus-4-5"
// created = "2026-01-30"
// modified = "2026-10-15"
// driver = "Isaac Clayton"

//! Edit operations and the append-only log they are recorded in.
//!
//! An operation is a self-contained fact about one character:
//! - Insert: "this character lives at Position P"
//! - Delete: "the character at Position P is gone"
//!
//! Positions are stable across concurrent edits, unlike visible indices,
//! so an operation means the same thing on every replica no matter what
//! arrived before it. Replaying an operation is always safe.

use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde::Serialize;

use super::position::Position;
use super::primitives::clock::Timestamp;
use super::primitives::clock::VersionVector;
use super::primitives::id::OpId;

/// An operation that can be applied to a document.
///
/// Serializes through `wire::WireOperation`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "crate::wire::WireOperation", try_from = "crate::wire::WireOperation")]
pub enum Operation {
    /// Insert a character at a position.
    Insert {
        /// The client that created this operation.
        client_id: String,
        character: char,
        position: Position,
        /// The client's clock when the operation was created.
        timestamp: Timestamp,
    },

    /// Delete the character at a position.
    Delete {
        /// The client that created this operation.
        client_id: String,
        position: Position,
        /// The client's clock when the operation was created.
        timestamp: Timestamp,
    },
}

impl Operation {
    /// Create an insert operation. The client id is taken from the timestamp.
    pub fn insert(character: char, position: Position, timestamp: Timestamp) -> Operation {
        return Operation::Insert {
            client_id: timestamp.client_id().to_string(),
            character,
            position,
            timestamp,
        };
    }

    /// Create a delete operation. The client id is taken from the timestamp.
    pub fn delete(position: Position, timestamp: Timestamp) -> Operation {
        return Operation::Delete {
            client_id: timestamp.client_id().to_string(),
            position,
            timestamp,
        };
    }

    pub fn client_id(&self) -> &str {
        match self {
            Operation::Insert { client_id, .. } => return client_id,
            Operation::Delete { client_id, .. } => return client_id,
        }
    }

    pub fn position(&self) -> &Position {
        match self {
            Operation::Insert { position, .. } => return position,
            Operation::Delete { position, .. } => return position,
        }
    }

    pub fn timestamp(&self) -> &Timestamp {
        match self {
            Operation::Insert { timestamp, .. } => return timestamp,
            Operation::Delete { timestamp, .. } => return timestamp,
        }
    }

    /// The inserted character, if this is an insert.
    pub fn character(&self) -> Option<char> {
        match self {
            Operation::Insert { character, .. } => return Some(*character),
            Operation::Delete { .. } => return None,
        }
    }

    pub fn is_insert(&self) -> bool {
        return matches!(self, Operation::Insert { .. });
    }

    /// The identity used for duplicate detection.
    pub fn id(&self) -> OpId {
        let timestamp = self.timestamp();
        return OpId::new(timestamp.client_id(), timestamp.counter());
    }
}

/// Every operation a document has accepted, in arrival order.
///
/// Never trimmed, not even by garbage collection, so it can be replayed to
/// rebuild a replica or streamed to a late joiner.
#[derive(Clone, Debug, Default)]
pub struct OpLog {
    ops: Vec<Operation>,
    seen: FxHashSet<OpId>,
    /// Positions of every recorded insert.
    inserted: FxHashSet<Position>,
}

impl OpLog {
    /// Create a new empty operation log.
    pub fn new() -> OpLog {
        return OpLog {
            ops: Vec::new(),
            seen: FxHashSet::default(),
            inserted: FxHashSet::default(),
        };
    }

    /// Append an operation. Returns false, and leaves the log untouched,
    /// if an operation with the same id was already recorded.
    pub fn push(&mut self, op: Operation) -> bool {
        if !self.seen.insert(op.id()) {
            return false;
        }
        if op.is_insert() {
            self.inserted.insert(op.position().clone());
        }
        self.ops.push(op);
        return true;
    }

    pub fn contains(&self, id: &OpId) -> bool {
        return self.seen.contains(id);
    }

    /// Whether an insert at `position` was ever recorded.
    pub fn inserted(&self, position: &Position) -> bool {
        return self.inserted.contains(position);
    }

    /// Operations not covered by `version`, in log order.
    pub fn since<'a>(&'a self, version: &'a VersionVector) -> impl Iterator<Item = &'a Operation> + 'a {
        return self.ops.iter().filter(move |op| {
            let timestamp = op.timestamp();
            !version.includes(timestamp.client_id(), timestamp.counter())
        });
    }

    /// Get all operations.
    pub fn ops(&self) -> &[Operation] {
        return &self.ops;
    }

    pub fn len(&self) -> usize {
        return self.ops.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.ops.is_empty();
    }
}
