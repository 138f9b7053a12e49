// model = "claude-opus-4-5"
// created = "2026-10-13"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Transport-agnostic record format for operations.
//!
//! ```text
//! {
//!   "type": "insert" | "delete",
//!   "client_id": string,
//!   "character": char,          (insert only)
//!   "position": [u32, ...],
//!   "timestamp": { "counter": u64, "client_id": string }
//! }
//! ```
//!
//! `Operation` serializes through `WireOperation`, so any serde format
//! works; the helpers here use JSON.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::crdt::op::Operation;
use crate::crdt::position::Position;
use crate::crdt::position::PositionError;
use crate::crdt::primitives::clock::Timestamp;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("insert without a character")]
    MissingCharacter,
    #[error("delete with a character")]
    UnexpectedCharacter,
    #[error(transparent)]
    Position(#[from] PositionError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireKind {
    Insert,
    Delete,
}

/// The flat record an `Operation` travels as.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireOperation {
    #[serde(rename = "type")]
    pub kind: WireKind,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<char>,
    pub position: Vec<u32>,
    pub timestamp: Timestamp,
}

impl From<Operation> for WireOperation {
    fn from(op: Operation) -> WireOperation {
        match op {
            Operation::Insert { client_id, character, position, timestamp } => {
                return WireOperation {
                    kind: WireKind::Insert,
                    client_id,
                    character: Some(character),
                    position: position.path().to_vec(),
                    timestamp,
                };
            }
            Operation::Delete { client_id, position, timestamp } => {
                return WireOperation {
                    kind: WireKind::Delete,
                    client_id,
                    character: None,
                    position: position.path().to_vec(),
                    timestamp,
                };
            }
        }
    }
}

impl TryFrom<WireOperation> for Operation {
    type Error = WireError;

    fn try_from(wire: WireOperation) -> Result<Operation, WireError> {
        let position = Position::from_path(&wire.position)?;
        match (wire.kind, wire.character) {
            (WireKind::Insert, Some(character)) => {
                return Ok(Operation::Insert {
                    client_id: wire.client_id,
                    character,
                    position,
                    timestamp: wire.timestamp,
                });
            }
            (WireKind::Insert, None) => return Err(WireError::MissingCharacter),
            (WireKind::Delete, None) => {
                return Ok(Operation::Delete {
                    client_id: wire.client_id,
                    position,
                    timestamp: wire.timestamp,
                });
            }
            (WireKind::Delete, Some(_)) => return Err(WireError::UnexpectedCharacter),
        }
    }
}

/// An operation addressed to a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub document: String,
    pub operation: Operation,
}

/// Encode an operation as a JSON record.
pub fn encode(op: &Operation) -> Result<String, WireError> {
    return Ok(serde_json::to_string(op)?);
}

/// Decode and validate a JSON record.
pub fn decode(json: &str) -> Result<Operation, WireError> {
    let wire: WireOperation = serde_json::from_str(json)?;
    return Operation::try_from(wire);
}

/// Decode one line of a JSON-lines envelope stream.
pub fn decode_envelope(json: &str) -> Result<Envelope, WireError> {
    return Ok(serde_json::from_str(json)?);
}
