//! Concurrency-bounded front for an embedding provider.

use std::sync::Arc;

use docrag_core::{EmbedMode, EmbeddingProvider, ProviderError};
use tokio::sync::Semaphore;
use tracing::debug;

/// Wraps an [`EmbeddingProvider`] with a semaphore limiting concurrent calls.
///
/// Remote providers rate-limit and local providers saturate the CPU, so every
/// embed call from the pipelines goes through one shared pool.
pub struct EmbedderPool {
    provider: Arc<dyn EmbeddingProvider>,
    semaphore: Semaphore,
    max_concurrent: usize,
}

impl EmbedderPool {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, max_concurrent: usize) -> Self {
        Self {
            provider,
            semaphore: Semaphore::new(max_concurrent),
            max_concurrent,
        }
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Embed a batch of texts under a concurrency permit.
    pub async fn embed_batch(
        &self,
        texts: &[&str],
        mode: EmbedMode,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ProviderError::Request(format!("semaphore closed: {e}")))?;

        debug!(batch = texts.len(), model = self.provider.model_name(), "embedding batch");
        self.provider.embed(texts, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashEmbedder;

    #[tokio::test]
    async fn pool_reports_provider_metadata() {
        let pool = EmbedderPool::new(Arc::new(HashEmbedder::new(128)), 4);
        assert_eq!(pool.dimension(), 128);
        assert_eq!(pool.model_name(), "hash-trigram");
        assert_eq!(pool.max_concurrent(), 4);
        assert_eq!(pool.available_permits(), 4);
    }

    #[tokio::test]
    async fn embed_batch_returns_one_vector_per_text() {
        let pool = EmbedderPool::new(Arc::new(HashEmbedder::new(128)), 2);
        let vectors = pool
            .embed_batch(&["one", "two", "three"], EmbedMode::Document)
            .await
            .unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 128));
    }

    #[tokio::test]
    async fn permits_are_returned_after_use() {
        let pool = Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(64)), 2));

        let a = Arc::clone(&pool);
        let b = Arc::clone(&pool);
        let h1 = tokio::spawn(async move { a.embed_batch(&["x"], EmbedMode::Query).await });
        let h2 = tokio::spawn(async move { b.embed_batch(&["y"], EmbedMode::Query).await });
        h1.await.unwrap().unwrap();
        h2.await.unwrap().unwrap();

        assert_eq!(pool.available_permits(), 2);
    }
}
