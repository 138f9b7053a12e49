// model = "claude-opus-4-5"
// created = "2026-10-14"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! A registry of independent documents.
//!
//! Each document sits behind its own lock, so operations on different
//! documents proceed in parallel and operations on one document are
//! serialized. The table itself is plain data; wrap it in a lock of your
//! own if documents are created or removed concurrently.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::config::Config;
use crate::crdt::document::Applied;
use crate::crdt::document::ApplyError;
use crate::crdt::document::Document;
use crate::crdt::op::Operation;

pub type DocumentHandle = Arc<Mutex<Document>>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("unknown document {0:?}")]
    UnknownDocument(String),
    #[error("document {0:?} already exists")]
    AlreadyExists(String),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

#[derive(Debug, Default)]
pub struct DocumentTable {
    documents: FxHashMap<String, DocumentHandle>,
    config: Config,
}

impl DocumentTable {
    pub fn new(config: Config) -> DocumentTable {
        return DocumentTable { documents: FxHashMap::default(), config };
    }

    pub fn config(&self) -> &Config {
        return &self.config;
    }

    pub fn create_document(&mut self, id: impl Into<String>) -> Result<DocumentHandle, TableError> {
        let id = id.into();
        if self.documents.contains_key(&id) {
            return Err(TableError::AlreadyExists(id));
        }
        info!(document = %id, "created document");
        let handle = Arc::new(Mutex::new(Document::with_config(id.clone(), &self.config)));
        self.documents.insert(id, handle.clone());
        return Ok(handle);
    }

    /// Fetch a document, creating it on first sight.
    pub fn get_or_create(&mut self, id: &str) -> DocumentHandle {
        if let Some(handle) = self.documents.get(id) {
            return handle.clone();
        }
        info!(document = %id, "created document");
        let handle = Arc::new(Mutex::new(Document::with_config(id, &self.config)));
        self.documents.insert(id.to_string(), handle.clone());
        return handle;
    }

    pub fn get(&self, id: &str) -> Result<DocumentHandle, TableError> {
        return self.documents
            .get(id)
            .cloned()
            .ok_or_else(|| TableError::UnknownDocument(id.to_string()));
    }

    pub fn remove(&mut self, id: &str) -> Result<DocumentHandle, TableError> {
        let handle = self.documents
            .remove(id)
            .ok_or_else(|| TableError::UnknownDocument(id.to_string()))?;
        info!(document = %id, "removed document");
        return Ok(handle);
    }

    pub fn len(&self) -> usize {
        return self.documents.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.documents.is_empty();
    }

    /// Document ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.documents.keys().cloned().collect();
        ids.sort();
        return ids;
    }

    pub fn apply_operation(&self, id: &str, op: Operation) -> Result<Applied, TableError> {
        let handle = self.get(id)?;
        let applied = handle.lock().apply(op)?;
        debug!(document = %id, ?applied, "applied operation");
        return Ok(applied);
    }

    pub fn visible_text(&self, id: &str) -> Result<String, TableError> {
        return Ok(self.get(id)?.lock().visible_text());
    }

    pub fn operation_log(&self, id: &str) -> Result<Vec<Operation>, TableError> {
        return Ok(self.get(id)?.lock().operations().to_vec());
    }

    pub fn configure_gc(&self, id: &str, threshold: Option<usize>) -> Result<(), TableError> {
        self.get(id)?.lock().set_garbage_collection_threshold(threshold);
        return Ok(());
    }

    pub fn collect_garbage(&self, id: &str) -> Result<usize, TableError> {
        return Ok(self.get(id)?.lock().collect_garbage());
    }
}
