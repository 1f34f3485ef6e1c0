//! Core types for docrag.
//!
//! ## Documents and chunks
//! - [`DocumentRecord`]: metadata about an ingested document
//! - [`ChunkRecord`]: one embedded slice of a document's text
//!
//! ## Search
//! - [`SearchHit`]: a vector-index match with its score
//! - [`EmbedMode`]: document-side vs query-side embedding
//!
//! ## Generation
//! - [`ModelTurn`]: one chat-model response, either text or a tool call
//! - [`ToolRequest`]: a model-requested function invocation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key addressing one vector entry in a [`crate::VectorIndex`].
///
/// Keys are allocated from a monotonically increasing high-water mark and are
/// never reused, even after removal. Negative values are reserved as "no
/// match" sentinels by index implementations that pad short result sets.
pub type IndexKey = i64;

// ============================================================================
// Documents
// ============================================================================

/// Metadata about an ingested document.
///
/// Created by [`crate::DocumentStore::insert`], which generates the id and
/// upload timestamp; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique document identifier
    pub id: Uuid,
    /// Original filename
    pub filename: String,
    /// When the document was ingested
    pub uploaded_at: DateTime<Utc>,
    /// Source file size in bytes
    pub size_bytes: u64,
}

/// Input for registering a new document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Original filename
    pub filename: String,
    /// Source file size in bytes
    pub size_bytes: u64,
}

// ============================================================================
// Chunks
// ============================================================================

/// One embedded slice of a document's text.
///
/// Chunk records are created in batches during ingestion of one document and
/// never mutated. Each record references exactly one vector-index entry via
/// `index_key`; the two are created together and destroyed together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique chunk identifier
    pub id: Uuid,
    /// Owning document (logical reference, not enforced by a join)
    pub document_id: Uuid,
    /// Chunk text, non-empty
    pub text: String,
    /// Key of the corresponding vector-index entry
    pub index_key: IndexKey,
}

/// Chunking parameters, in characters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum window length
    pub size: usize,
    /// Characters shared between consecutive windows
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            overlap: 200,
        }
    }
}

// ============================================================================
// Embedding and search
// ============================================================================

/// Which side of retrieval a text is embedded for.
///
/// Some providers produce asymmetric embeddings and need to know whether a
/// text is stored content or a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedMode {
    /// Text that will be stored and searched over
    Document,
    /// A search query
    Query,
}

/// A single vector-index match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Key of the matched entry, or a negative sentinel for "no match"
    pub key: IndexKey,
    /// Distance or similarity under the index's metric; hits arrive ordered
    /// best-first and callers must preserve that order
    pub score: f32,
}

// ============================================================================
// Deletion
// ============================================================================

/// Counts reported by a successful document deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    /// Vector entries removed from the index
    pub vectors_removed: u64,
    /// Chunk records deleted
    pub chunks_removed: u64,
    /// Document records deleted (0 or 1)
    pub documents_removed: u64,
}

// ============================================================================
// Generation
// ============================================================================

/// A model-requested function invocation, as decoded from the provider's
/// structured function-call payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Function name as reported by the model
    pub name: String,
    /// Arguments object
    pub arguments: serde_json::Value,
}

/// One chat-model response.
#[derive(Debug, Clone)]
pub enum ModelTurn {
    /// A direct text answer
    Text(String),
    /// The model wants a function executed before answering
    ToolCall(ToolRequest),
}
