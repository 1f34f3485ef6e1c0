//! # docrag-embed
//!
//! Embedding provider implementations and the concurrency pool that fronts
//! them.
//!
//! [`HashEmbedder`] is a deterministic local provider used by tests and
//! offline development; remote providers live in their own crates and plug
//! into the same [`docrag_core::EmbeddingProvider`] seam. [`EmbedderPool`]
//! wraps any provider with a semaphore bounding concurrent calls.

mod hash;
mod pool;

pub use hash::HashEmbedder;
pub use pool::EmbedderPool;
