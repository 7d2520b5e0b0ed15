use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::storage::{DocumentStore, FeedDocument};

/// Document store kept in process memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<FeedDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<FeedDocument> {
        self.documents.read().clone()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn save(&self, document: &FeedDocument) -> Result<()> {
        let mut documents = self.documents.write();

        if documents.iter().any(|d| d.id == document.id) {
            return Err(Error::AlreadyExists(format!("Document {} already stored", document.id)));
        }

        documents.push(document.clone());
        Ok(())
    }
}
