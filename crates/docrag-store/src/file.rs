//! File-backed stores.
//!
//! State lives in memory behind an `RwLock` and is written back in full
//! after every mutation. Fine for the document counts a single-node deploy
//! sees; anything bigger belongs in a real database behind the same traits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use docrag_core::{
    ChunkRecord, ChunkStore, DocumentRecord, DocumentStore, IndexKey, NewDocument, StoreError,
};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::{load_json, persist_json};

/// Chunk store persisted as a JSON file.
pub struct FileChunkStore {
    path: PathBuf,
    chunks: RwLock<Vec<ChunkRecord>>,
}

impl FileChunkStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let chunks: Vec<ChunkRecord> = load_json(&path).await?;
        info!(path = %path.display(), chunks = chunks.len(), "loaded chunk store");
        Ok(Self {
            path,
            chunks: RwLock::new(chunks),
        })
    }
}

#[async_trait]
impl ChunkStore for FileChunkStore {
    async fn insert_many(&self, new: &[ChunkRecord]) -> Result<(), StoreError> {
        let mut chunks = self.chunks.write().await;
        chunks.extend_from_slice(new);
        persist_json(&self.path, &*chunks).await
    }

    async fn find_by_document(&self, document_id: Uuid) -> Result<Vec<ChunkRecord>, StoreError> {
        Ok(self
            .chunks
            .read()
            .await
            .iter()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn find_by_index_keys(&self, keys: &[IndexKey]) -> Result<Vec<ChunkRecord>, StoreError> {
        let wanted: std::collections::HashSet<IndexKey> = keys.iter().copied().collect();
        Ok(self
            .chunks
            .read()
            .await
            .iter()
            .filter(|c| wanted.contains(&c.index_key))
            .cloned()
            .collect())
    }

    async fn delete_by_document(&self, document_id: Uuid) -> Result<u64, StoreError> {
        let mut chunks = self.chunks.write().await;
        let before = chunks.len();
        chunks.retain(|c| c.document_id != document_id);
        let removed = (before - chunks.len()) as u64;
        if removed > 0 {
            persist_json(&self.path, &*chunks).await?;
        }
        Ok(removed)
    }
}

/// Document store persisted as a JSON file.
pub struct FileDocumentStore {
    path: PathBuf,
    documents: RwLock<HashMap<Uuid, DocumentRecord>>,
}

impl FileDocumentStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let documents: HashMap<Uuid, DocumentRecord> = load_json(&path).await?;
        info!(path = %path.display(), documents = documents.len(), "loaded document store");
        Ok(Self {
            path,
            documents: RwLock::new(documents),
        })
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn insert(&self, document: NewDocument) -> Result<DocumentRecord, StoreError> {
        let record = DocumentRecord {
            id: Uuid::new_v4(),
            filename: document.filename,
            uploaded_at: Utc::now(),
            size_bytes: document.size_bytes,
        };
        let mut documents = self.documents.write().await;
        documents.insert(record.id, record.clone());
        persist_json(&self.path, &*documents).await?;
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        let mut docs: Vec<DocumentRecord> =
            self.documents.read().await.values().cloned().collect();
        docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(docs)
    }

    async fn delete(&self, id: Uuid) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        match documents.remove(&id) {
            Some(_) => {
                persist_json(&self.path, &*documents).await?;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
