//! In-memory vector index.

use async_trait::async_trait;
use docrag_core::{IndexError, IndexKey, SearchHit, VectorIndex};
use tokio::sync::RwLock;

struct MemoryState {
    next_key: IndexKey,
    entries: Vec<(IndexKey, Vec<f32>)>,
}

/// Vector index held entirely in memory.
///
/// Same contract as [`crate::FlatIndex`] minus durability: `flush` is a
/// no-op and the high-water key mark resets when the process exits.
pub struct MemoryIndex {
    dimension: usize,
    state: RwLock<MemoryState>,
}

impl MemoryIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: RwLock::new(MemoryState {
                next_key: 0,
                entries: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn len(&self) -> usize {
        self.state.read().await.entries.len()
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
            state.entries.push((*key, vector.clone()));
        }
        Ok(())
    }

    async fn remove(&self, keys: &[IndexKey]) -> Result<u64, IndexError> {
        let doomed: std::collections::HashSet<IndexKey> = keys.iter().copied().collect();
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|(key, _)| !doomed.contains(key));
        Ok((before - state.entries.len()) as u64)
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        let state = self.state.read().await;
        Ok(crate::nearest(
            state.entries.iter().map(|(key, v)| (*key, v.as_slice())),
            vector,
            k,
        ))
    }

    async fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allocated_keys_are_sequential_and_unique() {
        let index = MemoryIndex::new(4);
        let a = index.allocate_keys(3).await.unwrap();
        let b = index.allocate_keys(2).await.unwrap();
        assert_eq!(a, vec![0, 1, 2]);
        assert_eq!(b, vec![3, 4]);
    }

    #[tokio::test]
    async fn keys_are_not_reused_after_removal() {
        let index = MemoryIndex::new(2);
        let keys = index.allocate_keys(2).await.unwrap();
        index
            .insert(&keys, &[vec![1.0, 0.0], vec![0.0, 1.0]])
            .await
            .unwrap();
        index.remove(&keys).await.unwrap();

        let fresh = index.allocate_keys(1).await.unwrap();
        assert_eq!(fresh, vec![2]);
    }

    #[tokio::test]
    async fn removing_absent_keys_is_a_noop() {
        let index = MemoryIndex::new(2);
        let removed = index.remove(&[99, 100]).await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn remove_reports_only_present_keys() {
        let index = MemoryIndex::new(2);
        let keys = index.allocate_keys(2).await.unwrap();
        index
            .insert(&keys, &[vec![1.0, 0.0], vec![0.0, 1.0]])
            .await
            .unwrap();
        let removed = index.remove(&[keys[0], 777]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn search_returns_nearest_first() {
        let index = MemoryIndex::new(2);
        let keys = index.allocate_keys(3).await.unwrap();
        index
            .insert(
                &keys,
                &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.8, 0.2]],
            )
            .await
            .unwrap();

        let hits = index.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].key, keys[0]);
        assert_eq!(hits[1].key, keys[2]);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let index = MemoryIndex::new(3);
        let keys = index.allocate_keys(1).await.unwrap();
        let err = index.insert(&keys, &[vec![1.0, 2.0]]).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.search(&[0.0; 4], 1).await.is_err());
    }

    #[tokio::test]
    async fn empty_index_search_is_empty() {
        let index = MemoryIndex::new(2);
        assert!(index.search(&[0.0, 0.0], 5).await.unwrap().is_empty());
        assert!(index.is_empty().await);
    }
}
