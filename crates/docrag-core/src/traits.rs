//! Trait seams between pipeline stages.
//!
//! Every component the pipelines touch sits behind one of these traits so
//! that implementations can be swapped at configuration time: a remote
//! embedding provider or a deterministic local one, a file-backed index or an
//! in-memory one, and so on. All traits are object-safe and `Send + Sync` so
//! components can be shared as `Arc<dyn Trait>`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{ExtractError, IndexError, ProviderError, StoreError};
use crate::types::{
    ChunkRecord, DocumentRecord, EmbedMode, IndexKey, ModelTurn, NewDocument, SearchHit,
    ToolRequest,
};

/// Turns text into fixed-dimension embedding vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider identifier for logs and status output
    fn model_name(&self) -> &str;

    /// Output vector dimension; every vector returned by [`embed`](Self::embed)
    /// has exactly this length
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, returning one vector per input in order.
    ///
    /// `mode` distinguishes stored content from search queries for providers
    /// with asymmetric embeddings; symmetric providers may ignore it.
    async fn embed(
        &self,
        texts: &[&str],
        mode: EmbedMode,
    ) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Keyed nearest-neighbour vector index.
///
/// One implementation is selected at startup and owned by the pipelines; all
/// writers go through the same instance, which serializes mutation
/// internally.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Fixed vector dimension accepted by this index
    fn dimension(&self) -> usize;

    /// Number of live entries
    async fn len(&self) -> usize;

    /// Whether the index currently holds no entries
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Allocate `count` fresh keys from the index's persisted high-water
    /// mark. Allocated keys are never handed out again, even after the
    /// entries they address are removed.
    async fn allocate_keys(&self, count: usize) -> Result<Vec<IndexKey>, IndexError>;

    /// Insert one vector per key. `keys` and `vectors` must be the same
    /// length and every vector must match [`dimension`](Self::dimension).
    async fn insert(&self, keys: &[IndexKey], vectors: &[Vec<f32>]) -> Result<(), IndexError>;

    /// Remove the given keys, returning how many were actually present.
    /// Absent keys are ignored so a retried removal succeeds.
    async fn remove(&self, keys: &[IndexKey]) -> Result<u64, IndexError>;

    /// Return up to `k` nearest entries, best first. May return fewer than
    /// `k` hits when the index holds fewer entries; implementations that pad
    /// instead use negative sentinel keys, which callers must discard.
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError>;

    /// Make all prior mutations durable. A no-op for purely in-memory
    /// implementations.
    async fn flush(&self) -> Result<(), IndexError>;
}

/// Persistence for chunk records.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Insert a batch of chunk records
    async fn insert_many(&self, chunks: &[ChunkRecord]) -> Result<(), StoreError>;

    /// All chunks belonging to a document
    async fn find_by_document(&self, document_id: Uuid) -> Result<Vec<ChunkRecord>, StoreError>;

    /// Chunks whose index key appears in `keys`. Result order is not
    /// guaranteed; callers that need ranking must reorder.
    async fn find_by_index_keys(&self, keys: &[IndexKey]) -> Result<Vec<ChunkRecord>, StoreError>;

    /// Delete all chunks of a document, returning the number removed
    async fn delete_by_document(&self, document_id: Uuid) -> Result<u64, StoreError>;
}

/// Persistence for document records.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Register a document, generating its id and upload timestamp
    async fn insert(&self, document: NewDocument) -> Result<DocumentRecord, StoreError>;

    /// Look up one document
    async fn get(&self, id: Uuid) -> Result<Option<DocumentRecord>, StoreError>;

    /// All documents, most recently uploaded first
    async fn list(&self) -> Result<Vec<DocumentRecord>, StoreError>;

    /// Delete one document record, returning 1 if it existed and 0 otherwise
    async fn delete(&self, id: Uuid) -> Result<u64, StoreError>;
}

/// Extracts plain text from raw document bytes.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// MIME types this extractor accepts
    fn supported_types(&self) -> &[&str];

    /// Extract text from `bytes` of the given MIME type
    async fn extract(&self, bytes: &[u8], mime: &str) -> Result<String, ExtractError>;
}

/// Tool-calling chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier for logs and status output
    fn model_name(&self) -> &str;

    /// One generation pass; the model may answer directly or request a tool
    async fn generate(&self, prompt: &str) -> Result<ModelTurn, ProviderError>;

    /// Second pass after a tool was executed: the original prompt, the call
    /// the model requested, and the tool's JSON result
    async fn generate_with_tool_result(
        &self,
        prompt: &str,
        call: &ToolRequest,
        result: &serde_json::Value,
    ) -> Result<String, ProviderError>;
}
