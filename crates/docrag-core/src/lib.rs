//! # docrag-core
//!
//! Core types and traits for the docrag retrieval pipeline.
//!
//! This crate provides the foundational abstractions used throughout docrag:
//!
//! - **Embedding**: [`EmbeddingProvider`] trait for turning text into vectors
//! - **Vector Search**: [`VectorIndex`] trait for keyed nearest-neighbour search
//! - **Metadata Storage**: [`ChunkStore`] and [`DocumentStore`] traits for the
//!   two parallel metadata stores kept consistent with the index
//! - **Text Extraction**: [`TextExtractor`] trait consumed (not implemented)
//!   by the ingestion side
//! - **Generation**: [`ChatModel`] trait for the tool-calling chat surface
//!
//! ## Architecture
//!
//! The crate is organized around a pipeline pattern:
//!
//! ```text
//! Document -> TextExtractor -> chunker -> EmbeddingProvider -> VectorIndex
//!                                                |                  |
//!                                           ChunkStore  <-  search / remove
//! ```
//!
//! Ingestion writes the vector index before the chunk store, deletion removes
//! from the vector index before the chunk store; both orderings exist so that
//! a crash can only ever leave a vector without a chunk record (harmless dead
//! weight), never a chunk record pointing at a missing vector.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    ChunkError, Error, ExtractError, IndexError, ProviderError, Result, StoreError,
};
pub use traits::*;
pub use types::*;
