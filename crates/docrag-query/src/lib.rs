//! # docrag-query
//!
//! Read side of the pipeline: nearest-neighbour retrieval over ingested
//! chunks, and the query router that decides between answering directly,
//! executing a model-requested tool, or augmenting the prompt with retrieved
//! context.

mod retriever;
mod router;
mod tools;

pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use router::QueryRouter;
pub use tools::{
    AuthorizedUser, MemoryUserDirectory, ToolInvocation, UserDirectory, UserProfile,
};
