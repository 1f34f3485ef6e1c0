//! Document ingestion.

use std::sync::Arc;

use docrag_core::{
    ChunkConfig, ChunkRecord, ChunkStore, DocumentRecord, DocumentStore, EmbedMode, Error, Result,
    VectorIndex,
};
use docrag_embed::EmbedderPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::DocumentLocks;

/// Turns chunk texts into vector entries plus chunk records, keeping the
/// index and the chunk store consistent.
///
/// The index write and its flush complete before any chunk record exists, so
/// an interrupted ingestion can only leave vectors without chunks. If the
/// chunk-store write itself fails the fresh vectors are removed again, and
/// the store error still reaches the caller.
pub struct IngestionPipeline {
    embedder: Arc<EmbedderPool>,
    index: Arc<dyn VectorIndex>,
    chunks: Arc<dyn ChunkStore>,
    documents: Arc<dyn DocumentStore>,
    locks: Arc<DocumentLocks>,
    chunk_config: ChunkConfig,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<EmbedderPool>,
        index: Arc<dyn VectorIndex>,
        chunks: Arc<dyn ChunkStore>,
        documents: Arc<dyn DocumentStore>,
        locks: Arc<DocumentLocks>,
        chunk_config: ChunkConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            chunks,
            documents,
            locks,
            chunk_config,
        }
    }

    /// Embed and store pre-chunked texts for an already-registered document.
    /// Returns the number of chunks ingested.
    pub async fn ingest(&self, document_id: Uuid, texts: &[String]) -> Result<u32> {
        if texts.is_empty() {
            return Err(Error::Validation("no chunks to ingest".to_string()));
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Validation("empty chunk text".to_string()));
        }

        let _guard = self.locks.acquire(document_id).await;

        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self.embedder.embed_batch(&refs, EmbedMode::Document).await?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.index.dimension()) {
            return Err(Error::Validation(format!(
                "embedder produced {}-dimension vectors, index expects {}",
                bad.len(),
                self.index.dimension()
            )));
        }

        let keys = self.index.allocate_keys(texts.len()).await?;
        self.index.insert(&keys, &vectors).await?;
        self.index.flush().await?;
        debug!(document_id = %document_id, vectors = keys.len(), "index write durable");

        let records: Vec<ChunkRecord> = texts
            .iter()
            .zip(&keys)
            .map(|(text, key)| ChunkRecord {
                id: Uuid::new_v4(),
                document_id,
                text: text.clone(),
                index_key: *key,
            })
            .collect();

        if let Err(store_err) = self.chunks.insert_many(&records).await {
            warn!(
                document_id = %document_id,
                error = %store_err,
                "chunk store write failed, removing fresh vectors"
            );
            let mut compensated = self.index.remove(&keys).await.map(|_| ());
            if compensated.is_ok() {
                compensated = self.index.flush().await;
            }
            if let Err(index_err) = compensated {
                error!(
                    document_id = %document_id,
                    error = %index_err,
                    ?keys,
                    "could not remove vectors after store failure, index entries orphaned"
                );
            }
            return Err(store_err.into());
        }

        info!(
            document_id = %document_id,
            chunks = records.len(),
            "document ingested"
        );
        Ok(records.len() as u32)
    }

    /// Register a document, chunk its text, and ingest the chunks.
    ///
    /// The document record is removed again if anything after registration
    /// fails, so a failed call leaves no trace in any store.
    pub async fn ingest_document(
        &self,
        filename: &str,
        size_bytes: u64,
        text: &str,
    ) -> Result<(DocumentRecord, u32)> {
        let record = self
            .documents
            .insert(docrag_core::NewDocument {
                filename: filename.to_string(),
                size_bytes,
            })
            .await?;

        let outcome = async {
            let texts =
                docrag_chunker::chunk(text, self.chunk_config.size, self.chunk_config.overlap)?;
            self.ingest(record.id, &texts).await
        }
        .await;

        match outcome {
            Ok(count) => Ok((record, count)),
            Err(e) => {
                if let Err(cleanup) = self.documents.delete(record.id).await {
                    error!(
                        document_id = %record.id,
                        error = %cleanup,
                        "could not remove document record after failed ingestion"
                    );
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docrag_core::{IndexKey, StoreError};
    use docrag_embed::HashEmbedder;
    use docrag_index::MemoryIndex;
    use docrag_store::{MemoryChunkStore, MemoryDocumentStore};

    const DIM: usize = 64;

    struct FailingChunkStore;

    #[async_trait]
    impl ChunkStore for FailingChunkStore {
        async fn insert_many(&self, _chunks: &[ChunkRecord]) -> std::result::Result<(), StoreError> {
            Err(StoreError::Insert("disk full".to_string()))
        }
        async fn find_by_document(
            &self,
            _document_id: Uuid,
        ) -> std::result::Result<Vec<ChunkRecord>, StoreError> {
            Ok(Vec::new())
        }
        async fn find_by_index_keys(
            &self,
            _keys: &[IndexKey],
        ) -> std::result::Result<Vec<ChunkRecord>, StoreError> {
            Ok(Vec::new())
        }
        async fn delete_by_document(
            &self,
            _document_id: Uuid,
        ) -> std::result::Result<u64, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn ingest_writes_index_and_chunk_store() {
        let index = Arc::new(MemoryIndex::new(DIM));
        let chunks = Arc::new(MemoryChunkStore::new());
        let documents = Arc::new(MemoryDocumentStore::new());
        let pipeline = IngestionPipeline::new(
            Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(DIM)), 2)),
            index.clone(),
            chunks.clone(),
            documents,
            Arc::new(DocumentLocks::new()),
            ChunkConfig::default(),
        );

        let doc = Uuid::new_v4();
        let count = pipeline
            .ingest(doc, &["first chunk".to_string(), "second chunk".to_string()])
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(index.len().await, 2);
        let stored = chunks.find_by_document(doc).await.unwrap();
        assert_eq!(stored.len(), 2);
        // every chunk's key is live in the index
        for record in &stored {
            assert!(record.index_key >= 0);
        }
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_without_writes() {
        let index = Arc::new(MemoryIndex::new(DIM));
        let pipeline = IngestionPipeline::new(
            Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(DIM)), 2)),
            index.clone(),
            Arc::new(MemoryChunkStore::new()),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(DocumentLocks::new()),
            ChunkConfig::default(),
        );

        let err = pipeline.ingest(Uuid::new_v4(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(index.len().await, 0);

        let err = pipeline
            .ingest(Uuid::new_v4(), &["ok".to_string(), "   ".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(index.len().await, 0);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_validation_with_no_writes() {
        let index = Arc::new(MemoryIndex::new(32));
        let pipeline = IngestionPipeline::new(
            Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(DIM)), 2)),
            index.clone(),
            Arc::new(MemoryChunkStore::new()),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(DocumentLocks::new()),
            ChunkConfig::default(),
        );

        let err = pipeline
            .ingest(Uuid::new_v4(), &["text".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(index.len().await, 0);
    }

    #[tokio::test]
    async fn chunk_store_failure_rolls_back_index_writes() {
        let index = Arc::new(MemoryIndex::new(DIM));
        let pipeline = IngestionPipeline::new(
            Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(DIM)), 2)),
            index.clone(),
            Arc::new(FailingChunkStore),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(DocumentLocks::new()),
            ChunkConfig::default(),
        );

        let err = pipeline
            .ingest(Uuid::new_v4(), &["doomed".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        // compensating removal emptied the index again
        assert_eq!(index.len().await, 0);
        // but the burned key is not reissued
        assert_eq!(index.allocate_keys(1).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn ingest_document_registers_and_chunks() {
        let index = Arc::new(MemoryIndex::new(DIM));
        let chunks = Arc::new(MemoryChunkStore::new());
        let documents = Arc::new(MemoryDocumentStore::new());
        let pipeline = IngestionPipeline::new(
            Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(DIM)), 2)),
            index.clone(),
            chunks.clone(),
            documents.clone(),
            Arc::new(DocumentLocks::new()),
            ChunkConfig::default(),
        );

        let (record, count) = pipeline
            .ingest_document("cat.txt", 23, "The cat sat on the mat.")
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(record.filename, "cat.txt");
        assert!(documents.get(record.id).await.unwrap().is_some());
        assert_eq!(chunks.find_by_document(record.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_ingest_document_removes_the_record() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let pipeline = IngestionPipeline::new(
            Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(DIM)), 2)),
            Arc::new(MemoryIndex::new(DIM)),
            Arc::new(FailingChunkStore),
            documents.clone(),
            Arc::new(DocumentLocks::new()),
            ChunkConfig::default(),
        );

        let err = pipeline
            .ingest_document("doomed.txt", 10, "some text here")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(documents.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitespace_only_document_fails_cleanly() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let pipeline = IngestionPipeline::new(
            Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(DIM)), 2)),
            Arc::new(MemoryIndex::new(DIM)),
            Arc::new(MemoryChunkStore::new()),
            documents.clone(),
            Arc::new(DocumentLocks::new()),
            ChunkConfig::default(),
        );

        let err = pipeline
            .ingest_document("blank.txt", 3, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Chunking(_)));
        assert!(documents.list().await.unwrap().is_empty());
    }
}
