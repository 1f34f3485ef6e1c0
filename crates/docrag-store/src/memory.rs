//! In-memory stores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use docrag_core::{
    ChunkRecord, ChunkStore, DocumentRecord, DocumentStore, IndexKey, NewDocument, StoreError,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Chunk store held entirely in memory.
#[derive(Default)]
pub struct MemoryChunkStore {
    chunks: RwLock<Vec<ChunkRecord>>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn insert_many(&self, chunks: &[ChunkRecord]) -> Result<(), StoreError> {
        self.chunks.write().await.extend_from_slice(chunks);
        Ok(())
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
        Ok((before - chunks.len()) as u64)
    }
}

/// Document store held entirely in memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<Uuid, DocumentRecord>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, document: NewDocument) -> Result<DocumentRecord, StoreError> {
        let record = DocumentRecord {
            id: Uuid::new_v4(),
            filename: document.filename,
            uploaded_at: Utc::now(),
            size_bytes: document.size_bytes,
        };
        self.documents
            .write()
            .await
            .insert(record.id, record.clone());
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
        Ok(self.documents.write().await.remove(&id).map_or(0, |_| 1))
    }
}
