//! lex-store: store for German statutory text with semantic search
//!
//! Ingests legal codes from the public gesetze-im-internet.de XML source,
//! segments them into citable (code, section, sub_section) units, stores the
//! units with vector embeddings and serves keyword and semantic-similarity
//! queries over them.

pub mod config;
pub mod error;
pub mod providers;
pub mod scraper;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use scraper::GesetzeImInternetScraper;
pub use storage::LegalTextRepository;
pub use types::{LegalText, LegalTextFilter, LegalTextRecord};
