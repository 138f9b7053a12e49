// model = "claude-opus-4-5"
// created = 2026-02-01
// modified = 2026-10-14
// driver = "Isaac Clayton"

//! Shared primitives for the document engine.
//!
//! # Clocks
//! - `Timestamp`: Lamport counter tagged with its client
//! - `VersionVector`: highest counter seen per client
//!
//! # IDs
//! - `OpId`: operation identifier (client, counter)
//! - `Site`: a client id encoded as position segments

pub mod clock;
pub mod id;

// Re-exports for convenience
pub use clock::Timestamp;
pub use clock::VersionVector;
pub use id::OpId;
pub use id::Site;
