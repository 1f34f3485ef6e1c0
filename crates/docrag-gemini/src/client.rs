//! Shared HTTP plumbing for the Gemini endpoints.

use std::time::Duration;

use docrag_core::ProviderError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Per-request deadline; a call past this surfaces as a retryable
/// [`ProviderError::Request`] instead of stalling the pipeline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated connection to the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Build a client with a custom per-request timeout.
    pub fn with_timeout(
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Request(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// POST to `models/{model}:{method}` and deserialize the response.
    ///
    /// Transport failures, timeouts included, come back as
    /// [`ProviderError::Request`]; callers may retry those.
    pub(crate) async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        body: &B,
    ) -> Result<R, ProviderError> {
        let url = format!(
            "{}/models/{model}:{method}?key={}",
            self.base_url, self.api_key
        );
        debug!(model, method, "calling gemini");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("{model}:{method}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "{model}:{method} returned {status}: {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("{model}:{method}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clients_build_with_default_and_custom_timeouts() {
        assert!(GeminiClient::new("key").is_ok());
        assert!(GeminiClient::with_timeout("key", Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn a_stalled_server_times_out_as_a_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept connections but never answer them
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => held.push(socket),
                    Err(_) => break,
                }
            }
        });

        let client = GeminiClient::with_timeout("key", Duration::from_millis(200))
            .unwrap()
            .with_base_url(format!("http://{addr}"));

        let err = client
            .post::<_, serde_json::Value>(
                "embedding-001",
                "batchEmbedContents",
                &serde_json::json!({}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Request(_)));
    }
}
