// model = "claude-opus-4-5"
// created = "2026-01-30"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! The CRDT document engine.

pub mod document;
pub mod editor;
pub mod op;
pub mod position;
pub mod primitives;

/// A CRDT is a data type with a merge operator that is commutative,
/// associative, and idempotent.
pub trait Crdt {
    /// Merge another instance into this one.
    fn merge(&mut self, other: &Self);
}
