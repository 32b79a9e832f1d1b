//! Application state for the legal text store server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::providers::{EmbeddingProvider, OllamaEmbedder};
use crate::scraper::GesetzeImInternetScraper;
use crate::storage::LegalTextRepository;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// Repository for legal text records
    repository: Arc<LegalTextRepository>,
    /// Embedding provider
    embedder: Arc<dyn EmbeddingProvider>,
    /// Scraper for gesetze-im-internet.de
    scraper: Arc<GesetzeImInternetScraper>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing legal text store state...");

        let repository = Arc::new(LegalTextRepository::new(
            &config.database.path,
            config.embeddings.dimensions,
        )?);
        tracing::info!(path = %config.database.path.display(), "Repository initialized");

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(
            &config.ollama,
            config.embeddings.dimensions,
        ));
        tracing::info!(
            "Embedding provider initialized (model: {}, dimensions: {})",
            config.ollama.embed_model,
            config.embeddings.dimensions
        );

        let scraper = Arc::new(GesetzeImInternetScraper::new(&config.scraper));
        tracing::info!(base_url = %config.scraper.base_url, "Scraper initialized");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                repository,
                embedder,
                scraper,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the repository
    pub fn repository(&self) -> &Arc<LegalTextRepository> {
        &self.inner.repository
    }

    /// Get the embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get the scraper
    pub fn scraper(&self) -> &Arc<GesetzeImInternetScraper> {
        &self.inner.scraper
    }
}
