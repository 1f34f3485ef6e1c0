//! Document deletion.

use std::sync::Arc;

use docrag_core::{
    ChunkStore, DeletionReport, DocumentStore, Error, IndexKey, Result, VectorIndex,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::DocumentLocks;

/// Removes a document and everything derived from it.
///
/// Removal order is vectors, then chunk records, then the document record,
/// mirroring the ingestion ordering in reverse. An interruption at any point
/// leaves either stranded vectors (harmless) or a chunkless document record;
/// it never leaves a chunk whose vector is gone. Index removal tolerates
/// already-absent keys, so rerunning a half-finished deletion completes it.
pub struct DeletionPipeline {
    index: Arc<dyn VectorIndex>,
    chunks: Arc<dyn ChunkStore>,
    documents: Arc<dyn DocumentStore>,
    locks: Arc<DocumentLocks>,
}

impl DeletionPipeline {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        chunks: Arc<dyn ChunkStore>,
        documents: Arc<dyn DocumentStore>,
        locks: Arc<DocumentLocks>,
    ) -> Self {
        Self {
            index,
            chunks,
            documents,
            locks,
        }
    }

    /// Delete one document, returning what was removed.
    ///
    /// Fails with [`Error::NotFound`] when the document does not exist; in
    /// that case nothing is touched.
    pub async fn delete_document(&self, id: Uuid) -> Result<DeletionReport> {
        let _guard = self.locks.acquire(id).await;

        if self.documents.get(id).await?.is_none() {
            return Err(Error::NotFound(id));
        }

        let chunks = self.chunks.find_by_document(id).await?;
        let mut report = DeletionReport::default();

        if !chunks.is_empty() {
            let keys: Vec<IndexKey> = chunks.iter().map(|c| c.index_key).collect();
            let present = self.index.remove(&keys).await?;
            if present < keys.len() as u64 {
                // earlier interrupted deletion already took some vectors
                warn!(
                    document_id = %id,
                    expected = keys.len(),
                    removed = present,
                    "some vectors were already gone"
                );
            }
            self.index.flush().await?;
            report.vectors_removed = present;
            report.chunks_removed = self.chunks.delete_by_document(id).await?;
        }

        report.documents_removed = self.documents.delete(id).await?;

        info!(
            document_id = %id,
            vectors = report.vectors_removed,
            chunks = report.chunks_removed,
            "document deleted"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_core::{ChunkConfig, NewDocument};
    use docrag_embed::{EmbedderPool, HashEmbedder};
    use docrag_index::MemoryIndex;
    use docrag_store::{MemoryChunkStore, MemoryDocumentStore};

    use crate::IngestionPipeline;

    const DIM: usize = 64;

    struct Fixture {
        ingest: IngestionPipeline,
        delete: DeletionPipeline,
        index: Arc<MemoryIndex>,
        chunks: Arc<MemoryChunkStore>,
        documents: Arc<MemoryDocumentStore>,
    }

    fn fixture() -> Fixture {
        let index = Arc::new(MemoryIndex::new(DIM));
        let chunks = Arc::new(MemoryChunkStore::new());
        let documents = Arc::new(MemoryDocumentStore::new());
        let locks = Arc::new(DocumentLocks::new());
        let ingest = IngestionPipeline::new(
            Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(DIM)), 2)),
            index.clone(),
            chunks.clone(),
            documents.clone(),
            locks.clone(),
            ChunkConfig::default(),
        );
        let delete = DeletionPipeline::new(
            index.clone(),
            chunks.clone(),
            documents.clone(),
            locks,
        );
        Fixture {
            ingest,
            delete,
            index,
            chunks,
            documents,
        }
    }

    #[tokio::test]
    async fn deleting_a_three_chunk_document_removes_everything_once() {
        let f = fixture();
        let doc = f
            .documents
            .insert(NewDocument {
                filename: "three.txt".to_string(),
                size_bytes: 30,
            })
            .await
            .unwrap();
        f.ingest
            .ingest(
                doc.id,
                &[
                    "chunk one".to_string(),
                    "chunk two".to_string(),
                    "chunk three".to_string(),
                ],
            )
            .await
            .unwrap();

        let report = f.delete.delete_document(doc.id).await.unwrap();

        assert_eq!(report.vectors_removed, 3);
        assert_eq!(report.chunks_removed, 3);
        assert_eq!(report.documents_removed, 1);
        assert_eq!(f.index.len().await, 0);
        assert!(f.chunks.find_by_document(doc.id).await.unwrap().is_empty());
        assert!(f.documents.get(doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_missing_document_is_not_found_and_touches_nothing() {
        let f = fixture();
        let (kept, _) = f
            .ingest
            .ingest_document("kept.txt", 10, "survivor text")
            .await
            .unwrap();

        let err = f.delete.delete_document(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        assert_eq!(f.index.len().await, 1);
        assert_eq!(f.chunks.find_by_document(kept.id).await.unwrap().len(), 1);
        assert!(f.documents.get(kept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn zero_chunk_document_deletion_only_removes_the_record() {
        let f = fixture();
        let doc = f
            .documents
            .insert(NewDocument {
                filename: "empty.txt".to_string(),
                size_bytes: 0,
            })
            .await
            .unwrap();

        let report = f.delete.delete_document(doc.id).await.unwrap();
        assert_eq!(report.vectors_removed, 0);
        assert_eq!(report.chunks_removed, 0);
        assert_eq!(report.documents_removed, 1);
    }

    #[tokio::test]
    async fn second_deletion_is_not_found() {
        let f = fixture();
        let (doc, _) = f
            .ingest
            .ingest_document("once.txt", 9, "only once")
            .await
            .unwrap();

        f.delete.delete_document(doc.id).await.unwrap();
        let err = f.delete.delete_document(doc.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn other_documents_are_untouched_by_deletion() {
        let f = fixture();
        let (a, _) = f
            .ingest
            .ingest_document("a.txt", 5, "alpha text")
            .await
            .unwrap();
        let (b, _) = f
            .ingest
            .ingest_document("b.txt", 4, "beta text")
            .await
            .unwrap();

        f.delete.delete_document(a.id).await.unwrap();

        assert_eq!(f.index.len().await, 1);
        let remaining = f.chunks.find_by_document(b.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(f.documents.get(b.id).await.unwrap().is_some());
    }
}
