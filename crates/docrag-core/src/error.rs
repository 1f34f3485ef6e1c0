//! Error taxonomy.
//!
//! Each component owns a small error enum; the pipelines wrap them in the
//! top-level [`Error`] via `#[from]`. Ingestion and deletion propagate the
//! first failure they hit. Retrieval is the one exception: it logs failures
//! and degrades to an empty result instead of returning them.

use thiserror::Error;
use uuid::Uuid;

/// Convenience alias used throughout the pipeline crates
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for pipeline operations
#[derive(Debug, Error)]
pub enum Error {
    /// An embedding or chat provider call failed
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The vector index failed
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// A metadata store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Text chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Text extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// The referenced document does not exist
    #[error("document not found: {0}")]
    NotFound(Uuid),

    /// Caller-supplied input was rejected before any write happened
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Errors from embedding and chat providers
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request could not be sent or the provider answered with an error
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered but the payload could not be interpreted
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The provider is not configured (missing API key, endpoint, ...)
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Errors from vector index implementations
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index cannot serve requests at all
    #[error("index unavailable: {0}")]
    Unavailable(String),

    /// Persisted index state could not be read back
    #[error("index state corrupt: {0}")]
    Corrupt(String),

    /// Writing index state to disk failed
    #[error("index persist failed: {0}")]
    Persist(#[source] std::io::Error),

    /// A vector's length does not match the index dimension
    #[error("dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors from chunk and document stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert was rejected
    #[error("insert failed: {0}")]
    Insert(String),

    /// A lookup failed
    #[error("query failed: {0}")]
    Query(String),

    /// A delete failed
    #[error("delete failed: {0}")]
    Delete(String),

    /// Writing store state to disk failed
    #[error("store persist failed: {0}")]
    Persist(#[source] std::io::Error),
}

/// Errors from the text chunker
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The input text was empty or whitespace-only
    #[error("input text is empty")]
    EmptyInput,

    /// The chunking parameters are unusable
    #[error("invalid chunk config: {0}")]
    InvalidConfig(String),
}

/// Errors from text extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No extractor handles this MIME type
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    /// The type is supported but this particular payload could not be read
    #[error("could not extract text: {0}")]
    Unextractable(String),
}
