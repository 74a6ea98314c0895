//! Saved documents.
//!
//! [`DocumentStore`] is the seam the editor talks to; persistence backends
//! implement it. [`MemoryStore`] keeps everything in a map; embedders use it
//! when nothing needs to outlive the process.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    /// Where the user last exported the document, if anywhere.
    pub save_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub save_path: Option<PathBuf>,
}

/// Fields to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub save_path: Option<PathBuf>,
}

pub trait DocumentStore {
    fn get(&self, id: Uuid) -> Result<StoredDocument, StoreError>;

    /// Most recently updated first.
    fn list(&self) -> Vec<StoredDocument>;

    fn create(&mut self, doc: NewDocument) -> StoredDocument;

    fn update(&mut self, id: Uuid, patch: DocumentPatch) -> Result<StoredDocument, StoreError>;

    fn delete(&mut self, id: Uuid) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: HashMap<Uuid, (u64, StoredDocument)>,
    // breaks ties between writes landing on the same clock tick
    writes: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn next_write(&mut self) -> u64 {
        self.writes += 1;
        self.writes
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: Uuid) -> Result<StoredDocument, StoreError> {
        self.docs
            .get(&id)
            .map(|(_, doc)| doc.clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn list(&self) -> Vec<StoredDocument> {
        let mut entries: Vec<_> = self.docs.values().collect();
        entries.sort_by(|(wa, a), (wb, b)| b.updated_at.cmp(&a.updated_at).then(wb.cmp(wa)));
        entries.into_iter().map(|(_, doc)| doc.clone()).collect()
    }

    fn create(&mut self, doc: NewDocument) -> StoredDocument {
        let now = SystemTime::now();
        let stored = StoredDocument {
            id: Uuid::new_v4(),
            title: doc.title,
            content: doc.content,
            created_at: now,
            updated_at: now,
            save_path: doc.save_path,
        };
        let write = self.next_write();
        log::debug!("created document {}", stored.id);
        self.docs.insert(stored.id, (write, stored.clone()));
        stored
    }

    fn update(&mut self, id: Uuid, patch: DocumentPatch) -> Result<StoredDocument, StoreError> {
        let write = self.next_write();
        let (seq, doc) = self.docs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(content) = patch.content {
            doc.content = content;
        }
        if let Some(path) = patch.save_path {
            doc.save_path = Some(path);
        }
        doc.updated_at = SystemTime::now().max(doc.updated_at);
        *seq = write;
        Ok(doc.clone())
    }

    fn delete(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.docs
            .remove(&id)
            .map(|_| log::debug!("deleted document {id}"))
            .ok_or(StoreError::NotFound(id))
    }
}
