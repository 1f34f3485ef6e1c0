//! Nearest-neighbour chunk retrieval.

use std::collections::HashMap;
use std::sync::Arc;

use docrag_core::{ChunkStore, EmbedMode, Error, IndexKey, VectorIndex};
use docrag_embed::EmbedderPool;
use tracing::{debug, warn};

/// Default number of chunks injected into an augmented prompt
pub const DEFAULT_TOP_K: usize = 3;

/// Embeds a query, searches the vector index, and resolves the hits back to
/// chunk texts.
///
/// Retrieval sits on the answer path, where a degraded answer beats a failed
/// one, so [`retrieve`](Self::retrieve) never errors: every failure is
/// logged and collapses to an empty result.
pub struct Retriever {
    embedder: Arc<EmbedderPool>,
    index: Arc<dyn VectorIndex>,
    chunks: Arc<dyn ChunkStore>,
}

impl Retriever {
    pub fn new(
        embedder: Arc<EmbedderPool>,
        index: Arc<dyn VectorIndex>,
        chunks: Arc<dyn ChunkStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            chunks,
        }
    }

    /// The chunk texts most relevant to `query`, best match first.
    ///
    /// Blank queries, empty indexes, and internal failures all yield an
    /// empty vec.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Vec<String> {
        match self.try_retrieve(query, top_k).await {
            Ok(texts) => texts,
            Err(e) => {
                warn!(error = %e, "retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>, Error> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let vectors = self.embedder.embed_batch(&[query], EmbedMode::Query).await?;
        let query_vector = match vectors.into_iter().next() {
            Some(v) => v,
            None => return Ok(Vec::new()),
        };

        let hits = self.index.search(&query_vector, top_k).await?;
        // padding sentinels from a short index carry no chunk
        let keys: Vec<IndexKey> = hits
            .iter()
            .map(|h| h.key)
            .filter(|key| *key >= 0)
            .collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.chunks.find_by_index_keys(&keys).await?;
        let mut by_key: HashMap<IndexKey, String> = records
            .into_iter()
            .map(|record| (record.index_key, record.text))
            .collect();

        // store answers are unordered; restore the index's ranking
        let mut texts = Vec::with_capacity(keys.len());
        for key in &keys {
            match by_key.remove(key) {
                Some(text) => texts.push(text),
                None => warn!(key, "index hit has no chunk record"),
            }
        }

        debug!(query_len = query.len(), hits = texts.len(), "retrieved context");
        Ok(texts)
    }
}
