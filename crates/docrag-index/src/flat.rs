//! File-backed flat vector index.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docrag_core::{IndexError, IndexKey, SearchHit, VectorIndex};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// On-disk snapshot. Vectors are flattened row-major; entry `i` owns
/// `vectors[i * dimension .. (i + 1) * dimension]` under key `keys[i]`.
#[derive(Debug, Serialize, Deserialize)]
struct FlatState {
    dimension: usize,
    next_key: IndexKey,
    keys: Vec<IndexKey>,
    vectors: Vec<f32>,
}

/// Brute-force L2 index persisted as a single JSON file.
///
/// `flush` snapshots the current state and writes it with a
/// temp-file-fsync-rename sequence, so the file on disk is always a complete
/// snapshot from some point in time. The key high-water mark is part of the
/// snapshot; reopening the file continues allocation where it left off and
/// never re-issues a key.
#[derive(Debug)]
pub struct FlatIndex {
    dimension: usize,
    path: PathBuf,
    state: RwLock<FlatState>,
    // Serializes flush; concurrent flushes would race on the temp file.
    persist_lock: Mutex<()>,
}

impl FlatIndex {
    /// Open the index at `path`, creating an empty one if the file does not
    /// exist yet.
    pub async fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self, IndexError> {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let state: FlatState = serde_json::from_slice(&bytes)
                    .map_err(|e| IndexError::Corrupt(format!("{}: {e}", path.display())))?;
                if state.dimension != dimension {
                    return Err(IndexError::DimensionMismatch {
                        expected: dimension,
                        actual: state.dimension,
                    });
                }
                if state.keys.len() * dimension != state.vectors.len() {
                    return Err(IndexError::Corrupt(format!(
                        "{}: {} keys but {} floats",
                        path.display(),
                        state.keys.len(),
                        state.vectors.len()
                    )));
                }
                info!(
                    path = %path.display(),
                    entries = state.keys.len(),
                    next_key = state.next_key,
                    "loaded flat index"
                );
                state
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), dimension, "starting empty flat index");
                FlatState {
                    dimension,
                    next_key: 0,
                    keys: Vec::new(),
                    vectors: Vec::new(),
                }
            }
            Err(e) => return Err(IndexError::Persist(e)),
        };

        Ok(Self {
            dimension,
            path,
            state: RwLock::new(state),
            persist_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn len(&self) -> usize {
        self.state.read().await.keys.len()
    }

    async fn allocate_keys(&self, count: usize) -> Result<Vec<IndexKey>, IndexError> {
        let mut state = self.state.write().await;
        let first = state.next_key;
        state.next_key += count as IndexKey;
        Ok((first..state.next_key).collect())
    }

    async fn insert(&self, keys: &[IndexKey], vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        if keys.len() != vectors.len() {
            return Err(IndexError::Unavailable(format!(
                "{} keys for {} vectors",
                keys.len(),
                vectors.len()
            )));
        }
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        let mut state = self.state.write().await;
        for (key, vector) in keys.iter().zip(vectors) {
            state.keys.push(*key);
            state.vectors.extend_from_slice(vector);
        }
        Ok(())
    }

    async fn remove(&self, keys: &[IndexKey]) -> Result<u64, IndexError> {
        let doomed: std::collections::HashSet<IndexKey> = keys.iter().copied().collect();
        let mut state = self.state.write().await;

        let dim = self.dimension;
        let mut kept_keys = Vec::with_capacity(state.keys.len());
        let mut kept_vectors = Vec::with_capacity(state.vectors.len());
        let mut removed = 0u64;
        for (i, key) in state.keys.iter().enumerate() {
            if doomed.contains(key) {
                removed += 1;
            } else {
                kept_keys.push(*key);
                kept_vectors.extend_from_slice(&state.vectors[i * dim..(i + 1) * dim]);
            }
        }
        state.keys = kept_keys;
        state.vectors = kept_vectors;
        Ok(removed)
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        let state = self.state.read().await;
        let dim = self.dimension;
        Ok(crate::nearest(
            state
                .keys
                .iter()
                .enumerate()
                .map(|(i, key)| (*key, &state.vectors[i * dim..(i + 1) * dim])),
            vector,
            k,
        ))
    }

    async fn flush(&self) -> Result<(), IndexError> {
        let _guard = self.persist_lock.lock().await;

        let json = {
            let state = self.state.read().await;
            serde_json::to_vec(&*state)
                .map_err(|e| IndexError::Corrupt(format!("serialize: {e}")))?
        };

        let path = self.path.clone();
        let tmp = self.path.with_extension("json.tmp");
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            use std::io::Write;
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
            std::fs::rename(&tmp, &path)?;
            Ok(())
        })
        .await
        .map_err(|e| IndexError::Unavailable(format!("flush task failed: {e}")))?
        .map_err(IndexError::Persist)?;

        debug!(path = %self.path.display(), "flushed flat index");
        Ok(())
    }
}
