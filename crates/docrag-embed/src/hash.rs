//! Deterministic feature-hashing embedder.

use async_trait::async_trait;
use docrag_core::{EmbedMode, EmbeddingProvider, ProviderError};

/// Default output dimension, matching the remote providers
pub const DEFAULT_DIMENSION: usize = 768;

/// Local embedder that hashes character trigrams and word unigrams into a
/// fixed-dimension vector.
///
/// Texts that share surface vocabulary share hashed features and therefore
/// land close together under an L2 metric, which is enough for tests and for
/// running the full pipeline without network access. Each feature is hashed
/// with blake3 to pick a bucket and a sign, and the final vector is
/// L2-normalized. The same text always produces the same vector; `mode` is
/// ignored because the representation is symmetric.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let normalized = text.to_lowercase();

        // Pad so edge trigrams get the same treatment as interior ones.
        let padded: Vec<char> = std::iter::once(' ')
            .chain(normalized.chars())
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            let feature: String = window.iter().collect();
            self.add_feature(&mut vector, "tri", &feature);
        }

        // Word unigrams weigh whole-token matches above trigram noise.
        for word in normalized.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric());
            if !word.is_empty() {
                self.add_feature(&mut vector, "uni", word);
                self.add_feature(&mut vector, "uni", word);
            }
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], kind: &str, feature: &str) {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.as_bytes());
        hasher.update(&[0]);
        hasher.update(feature.as_bytes());
        let digest = hasher.finalize();
        let bytes = digest.as_bytes();

        let bucket = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize % self.dimension;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-trigram"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(
        &self,
        texts: &[&str],
        _mode: EmbedMode,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder
            .embed(&["The cat sat on the mat."], EmbedMode::Document)
            .await
            .unwrap();
        let b = embedder
            .embed(&["The cat sat on the mat."], EmbedMode::Query)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let embedder = HashEmbedder::default();
        let vectors = embedder
            .embed(&["hello world", "completely different text"], EmbedMode::Document)
            .await
            .unwrap();
        for v in &vectors {
            assert_eq!(v.len(), DEFAULT_DIMENSION);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn related_text_is_closer_than_unrelated() {
        let embedder = HashEmbedder::default();
        let vectors = embedder
            .embed(
                &[
                    "The cat sat on the mat.",
                    "Paris is the capital of France.",
                    "Tell me about the cat",
                ],
                EmbedMode::Document,
            )
            .await
            .unwrap();
        let cat_chunk = &vectors[0];
        let france_chunk = &vectors[1];
        let cat_query = &vectors[2];

        assert!(l2(cat_query, cat_chunk) < l2(cat_query, france_chunk));
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let embedder = HashEmbedder::new(64);
        let batch = embedder
            .embed(&["alpha", "beta"], EmbedMode::Document)
            .await
            .unwrap();
        let alpha = embedder.embed(&["alpha"], EmbedMode::Document).await.unwrap();
        let beta = embedder.embed(&["beta"], EmbedMode::Document).await.unwrap();
        assert_eq!(batch[0], alpha[0]);
        assert_eq!(batch[1], beta[0]);
    }

    #[tokio::test]
    async fn empty_batch_is_fine() {
        let embedder = HashEmbedder::default();
        let vectors = embedder.embed(&[], EmbedMode::Document).await.unwrap();
        assert!(vectors.is_empty());
    }
}
