//! # docrag-pipeline
//!
//! Write-side pipelines: ingestion and deletion.
//!
//! Both pipelines mutate the vector index and the metadata stores, and both
//! serialize per document through [`DocumentLocks`] so concurrent operations
//! on the same document cannot interleave. The write ordering is fixed:
//! the vector index is always written (and flushed) before the chunk store,
//! and vectors are always removed before chunk records. A crash can
//! therefore only strand a vector without a chunk record, which retrieval
//! already tolerates, never a chunk record pointing at a missing vector.

mod delete;
mod ingest;
mod locks;

pub use delete::DeletionPipeline;
pub use ingest::IngestionPipeline;
pub use locks::DocumentLocks;
