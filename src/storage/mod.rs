pub mod couch;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::feed::FeedEntry;

pub use couch::CouchStore;
pub use memory::MemoryStore;

/// Record written for each persisted entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub date: Option<String>,
    pub title: String,
    pub link: String,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub text: Option<String>,
}

impl FeedDocument {
    /// Build the document for `entry`. The id is derived from the link so
    /// the same article always maps to the same document.
    pub fn new(entry: &FeedEntry, text: Option<String>) -> Self {
        Self {
            id: document_id(&entry.link),
            date: entry.published_string(),
            title: entry.title.clone(),
            link: entry.link.clone(),
            description: entry.description.clone(),
            text,
        }
    }
}

pub fn document_id(link: &str) -> String {
    blake3::hash(link.as_bytes()).to_hex().to_string()
}

/// Destination for persisted entries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Save one document. `Error::AlreadyExists` means a document with the
    /// same id is already stored.
    async fn save(&self, document: &FeedDocument) -> Result<()>;
}
