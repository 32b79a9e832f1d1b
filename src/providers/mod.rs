//! Embedding providers

pub mod embedding;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use ollama::OllamaEmbedder;
