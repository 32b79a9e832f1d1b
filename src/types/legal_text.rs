//! Core legal text types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One citable unit of statutory text, produced by the scrape pipeline
/// before persistence.
///
/// Within a single scrape run the tuple (code, section, sub_section) is
/// unique; the segmenter groups paragraphs to guarantee this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalText {
    /// The text body (paragraphs joined with blank lines)
    pub text: String,
    /// Code identifier as used to fetch the document (e.g. "bgb").
    /// Deliberately the caller-supplied code, not the document's own
    /// abbreviation, so stored records can be queried by the same key.
    pub code: String,
    /// Human-readable section label (e.g. "§ 1")
    pub section: String,
    /// Sub-section number (e.g. "2a"); empty when the section has no
    /// explicit numbered sub-sections
    pub sub_section: String,
}

/// A persisted legal text with its surrogate id and embedding vector.
///
/// The storage layer enforces UNIQUE(code, section, sub_section);
/// re-inserting an existing key updates text and vector in place.
#[derive(Debug, Clone, Serialize)]
pub struct LegalTextRecord {
    /// Surrogate identifier (SQLite rowid)
    pub id: i64,
    /// The text body
    pub text: String,
    /// Code identifier
    pub code: String,
    /// Section label
    pub section: String,
    /// Sub-section number, possibly empty
    pub sub_section: String,
    /// Embedding vector, fixed dimensionality, set at embedding time.
    /// Never serialized in API responses.
    #[serde(skip_serializing)]
    pub text_vector: Vec<f32>,
    /// Last upsert time
    pub updated_at: DateTime<Utc>,
}

/// Filter for retrieving stored legal texts.
///
/// `sub_section` is only meaningful combined with `section`; the HTTP
/// boundary rejects a sub_section filter without a section filter before
/// it reaches the repository.
#[derive(Debug, Clone, Default)]
pub struct LegalTextFilter {
    /// Code identifier (required)
    pub code: String,
    /// Optional section label
    pub section: Option<String>,
    /// Optional sub-section number
    pub sub_section: Option<String>,
}

impl LegalTextFilter {
    /// Filter by code only
    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }
}
