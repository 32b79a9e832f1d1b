//! Ollama embedding provider with retry logic

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::OllamaConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

/// Ollama embedding provider speaking the `/api/embed` endpoint.
///
/// Requests are chunked to at most `batch_size` texts so a large import
/// cannot blow up a single request.
pub struct OllamaEmbedder {
    client: Client,
    config: OllamaConfig,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &OllamaConfig, dimensions: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .unwrap_or_default();

        Self {
            client,
            config: config.clone(),
            dimensions,
        }
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Embedding request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.config.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::embedding("unknown error")))
    }

    /// Embed one chunk of at most `batch_size` texts in a single request.
    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.config.base_url);
        let model = self.config.embed_model.clone();
        let auth_token = self.config.auth_token.clone();
        let client = self.client.clone();
        let input = texts.to_vec();

        let embeddings = self
            .retry_request(|| {
                let url = url.clone();
                let model = model.clone();
                let auth_token = auth_token.clone();
                let client = client.clone();
                let input = input.clone();

                async move {
                    let request = EmbedRequest { model, input };

                    let mut builder = client.post(&url).json(&request);
                    if let Some(token) = auth_token.as_deref() {
                        builder = builder.bearer_auth(token);
                    }

                    let response = builder
                        .send()
                        .await
                        .map_err(|e| Error::embedding(format!("request failed: {}", e)))?;

                    if !response.status().is_success() {
                        return Err(Error::embedding(format!(
                            "embedding failed: HTTP {}",
                            response.status()
                        )));
                    }

                    let embed_response: EmbedResponse = response
                        .json()
                        .await
                        .map_err(|e| Error::embedding(format!("failed to parse response: {}", e)))?;

                    Ok(embed_response.embeddings)
                }
            })
            .await?;

        if embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "provider returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let mut embeddings = self.embed_chunk(&input).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::embedding("provider returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            embeddings.extend(self.embed_chunk(chunk).await?);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
