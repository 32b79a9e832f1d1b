//! API response types

use serde::Serialize;

use super::legal_text::LegalTextRecord;

/// Response for `GET /legal-texts/gesetze-im-internet/codes`
#[derive(Debug, Serialize)]
pub struct CodesResponse {
    /// Distinct codes present in the store
    pub codes: Vec<String>,
}

/// Response for `GET /legal-texts/gesetze-im-internet/{code}`
#[derive(Debug, Serialize)]
pub struct LegalTextsResponse {
    /// The queried code
    pub code: String,
    /// Number of matching records
    pub count: usize,
    /// Matching records
    pub results: Vec<LegalTextRecord>,
}

/// One semantic search hit with its raw distance
#[derive(Debug, Serialize)]
pub struct SearchHit {
    /// The matched record
    #[serde(flatten)]
    pub record: LegalTextRecord,
    /// Distance from the query vector (smaller is more similar)
    pub distance: f32,
}

/// Response for `GET /legal-texts/gesetze-im-internet/{code}/search`
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// The query text
    pub query: String,
    /// The queried code
    pub code: String,
    /// Number of hits returned
    pub count: usize,
    /// Hits ordered by ascending distance
    pub results: Vec<SearchHit>,
}

/// Response for `POST /legal-texts/gesetze-im-internet/{code}`
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    /// The imported code
    pub code: String,
    /// Number of legal texts upserted
    pub texts_imported: usize,
    /// Human-readable summary
    pub message: String,
}
