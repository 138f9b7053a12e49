// model = "claude-opus-4-5"
// created = "2026-01-30"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Scribe - A replicated plain-text document engine.
//!
//! Every character carries a dense, totally ordered position. Replicas
//! exchange insert and delete operations in any order, any number of
//! times, and converge to the same text.
//!
//! # Quick Start
//!
//! ```
//! use scribe::config::Config;
//! use scribe::crdt::document::Document;
//! use scribe::crdt::editor::Editor;
//!
//! let config = Config::default();
//! let mut alice_doc = Document::with_config("alice", &config);
//! let mut bob_doc = Document::with_config("bob", &config);
//! let mut alice = Editor::new("alice", &config);
//!
//! // Edit locally, then ship the operations to the other replica.
//! let ops = alice.insert_str(&mut alice_doc, 0, "Hello, World!").unwrap();
//! for op in ops.into_iter().rev() {
//!     bob_doc.apply(op).unwrap();
//! }
//! assert_eq!(bob_doc.visible_text(), "Hello, World!");
//! assert_eq!(alice_doc.digest(), bob_doc.digest());
//! ```

pub mod config;
pub mod crdt;
pub mod hash;
pub mod table;
pub mod wire;
