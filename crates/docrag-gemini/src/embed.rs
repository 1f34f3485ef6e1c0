//! Gemini embedding provider.

use async_trait::async_trait;
use docrag_core::{EmbedMode, EmbeddingProvider, ProviderError};
use serde::{Deserialize, Serialize};

use crate::GeminiClient;

const MODEL: &str = "embedding-001";
const DIMENSION: usize = 768;

/// Remote embedder backed by the `embedding-001` model.
///
/// Gemini embeddings are asymmetric, so [`EmbedMode`] maps onto the API's
/// `RETRIEVAL_DOCUMENT` / `RETRIEVAL_QUERY` task types.
pub struct GeminiEmbedder {
    client: GeminiClient,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest {
    model: String,
    content: Content,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<Embedding>,
}

#[derive(Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

fn task_type(mode: EmbedMode) -> &'static str {
    match mode {
        EmbedMode::Document => "RETRIEVAL_DOCUMENT",
        EmbedMode::Query => "RETRIEVAL_QUERY",
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn model_name(&self) -> &str {
        MODEL
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn embed(
        &self,
        texts: &[&str],
        mode: EmbedMode,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: format!("models/{MODEL}"),
                    content: Content {
                        parts: vec![Part {
                            text: (*text).to_string(),
                        }],
                    },
                    task_type: task_type(mode),
                })
                .collect(),
        };

        let response: BatchEmbedResponse =
            self.client.post(MODEL, "batchEmbedContents", &body).await?;

        if response.embeddings.len() != texts.len() {
            return Err(ProviderError::MalformedResponse(format!(
                "asked for {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}
