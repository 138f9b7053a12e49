// model = "claude-opus-4-5"
// created = "2026-10-13"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! A local client's view of a document.
//!
//! Users think in visible indices; the document only understands
//! positions. The editor bridges the two: it turns "insert 'x' at index 3"
//! into an `Operation`, applies it locally, and hands it back to be
//! broadcast to the other replicas.

use thiserror::Error;

use crate::config::Config;
use super::document::ApplyError;
use super::document::Document;
use super::op::Operation;
use super::position::Allocator;
use super::position::PositionError;
use super::primitives::clock::Timestamp;
use super::primitives::id::Site;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Produces operations on behalf of one client.
#[derive(Clone, Debug)]
pub struct Editor {
    clock: Timestamp,
    allocator: Allocator,
}

impl Editor {
    pub fn new(client_id: impl Into<String>, config: &Config) -> Editor {
        let client_id = client_id.into();
        let allocator = Allocator::new(config, Site::of(&client_id));
        return Editor {
            clock: Timestamp::new(client_id),
            allocator,
        };
    }

    pub fn client_id(&self) -> &str {
        return self.clock.client_id();
    }

    pub fn clock(&self) -> &Timestamp {
        return &self.clock;
    }

    /// Insert `character` so it becomes visible index `index`.
    pub fn insert(&mut self, doc: &mut Document, index: usize, character: char) -> Result<Operation, EditError> {
        let (lo, hi) = doc.gap(index).ok_or(EditError::OutOfBounds { index, len: doc.len() })?;
        let timestamp = self.tick(doc);
        let position = self.allocator.between_stamped(&lo, &hi, timestamp.counter())?;
        let op = Operation::insert(character, position, timestamp);
        doc.apply(op.clone())?;
        return Ok(op);
    }

    /// Insert `text` starting at visible index `index`.
    pub fn insert_str(&mut self, doc: &mut Document, index: usize, text: &str) -> Result<Vec<Operation>, EditError> {
        let mut ops = Vec::new();
        for (offset, character) in text.chars().enumerate() {
            ops.push(self.insert(doc, index + offset, character)?);
        }
        return Ok(ops);
    }

    /// Delete the character at visible index `index`.
    pub fn delete(&mut self, doc: &mut Document, index: usize) -> Result<Operation, EditError> {
        let position = match doc.position_at(index) {
            Some(position) => position.clone(),
            None => return Err(EditError::OutOfBounds { index, len: doc.len() }),
        };
        let timestamp = self.tick(doc);
        let op = Operation::delete(position, timestamp);
        doc.apply(op.clone())?;
        return Ok(op);
    }

    /// Catch up with everything the document has seen, then count one event.
    fn tick(&mut self, doc: &Document) -> Timestamp {
        self.clock.merge(doc.timestamp());
        self.clock.increment();
        return self.clock.clone();
    }
}
