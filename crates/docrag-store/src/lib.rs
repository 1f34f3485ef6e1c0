//! # docrag-store
//!
//! Metadata stores behind the [`docrag_core::ChunkStore`] and
//! [`docrag_core::DocumentStore`] seams.
//!
//! In-memory variants back tests and throwaway sessions; file-backed variants
//! persist their full state as JSON after every mutation, using the same
//! atomic write-then-rename discipline as the flat vector index.

mod file;
mod memory;

pub use file::{FileChunkStore, FileDocumentStore};
pub use memory::{MemoryChunkStore, MemoryDocumentStore};

use std::path::Path;

use docrag_core::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Load persisted JSON state, treating a missing file as empty state.
async fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Query(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(StoreError::Persist(e)),
    }
}

/// Atomically replace `path` with the JSON serialization of `value`.
async fn persist_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json =
        serde_json::to_vec(value).map_err(|e| StoreError::Persist(std::io::Error::other(e)))?;

    let path = path.to_path_buf();
    let tmp = path.with_extension("json.tmp");
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Persist(std::io::Error::other(e)))?
    .map_err(StoreError::Persist)
}
