//! Legal text endpoints: retrieval, search and import

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    CodesResponse, ImportResponse, LegalTextFilter, LegalTextsResponse, SearchHit, SearchResponse,
};

/// Query parameters for text retrieval
#[derive(Debug, Default, Deserialize)]
pub struct TextFilterParams {
    /// Optional section label filter
    pub section: Option<String>,
    /// Optional sub-section filter; requires `section`
    pub sub_section: Option<String>,
}

/// Query parameters for semantic search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// The query text
    pub q: String,
    /// Maximum number of hits (default 10)
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Optional distance cutoff; hits further away are excluded
    pub cutoff: Option<f32>,
}

fn default_limit() -> usize {
    10
}

/// GET /legal-texts/gesetze-im-internet/codes - list stored codes
pub async fn get_available_codes(State(state): State<AppState>) -> Result<Json<CodesResponse>> {
    let codes = state.repository().list_codes()?;
    Ok(Json(CodesResponse { codes }))
}

/// GET /legal-texts/gesetze-im-internet/:code - retrieve stored texts
pub async fn get_legal_texts(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<TextFilterParams>,
) -> Result<Json<LegalTextsResponse>> {
    let filter = validate_filter(code, params)?;

    let results = state.repository().get(&filter)?;
    if results.is_empty() {
        return Err(Error::NotFound(format!(
            "No legal texts found for code '{}'",
            filter.code
        )));
    }

    Ok(Json(LegalTextsResponse {
        code: filter.code,
        count: results.len(),
        results,
    }))
}

/// GET /legal-texts/gesetze-im-internet/:code/search - semantic search
pub async fn semantic_search(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    tracing::info!(%code, query = %params.q, "semantic search");

    let query_vector = state.embedder().embed(&params.q).await?;
    let hits =
        state
            .repository()
            .semantic_search(&query_vector, &code, params.limit, params.cutoff)?;

    let results: Vec<SearchHit> = hits
        .into_iter()
        .map(|(record, distance)| SearchHit { record, distance })
        .collect();

    Ok(Json(SearchResponse {
        query: params.q,
        code,
        count: results.len(),
        results,
    }))
}

/// POST /legal-texts/gesetze-im-internet/:code - import a legal code
///
/// Scrapes the code, embeds every unit's text in bounded batches and
/// upserts the records, so re-imports update in place.
pub async fn import_legal_texts(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ImportResponse>> {
    tracing::info!(%code, "importing legal texts");

    let texts = state.scraper().scrape(&code).await?;

    let batch_size = state.config().ollama.batch_size.max(1);
    let mut entries = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let bodies: Vec<String> = batch.iter().map(|t| t.text.clone()).collect();
        let embeddings = state.embedder().embed_batch(&bodies).await?;
        if embeddings.len() != batch.len() {
            return Err(Error::embedding(format!(
                "provider returned {} embeddings for {} texts",
                embeddings.len(),
                batch.len()
            )));
        }
        entries.extend(batch.iter().cloned().zip(embeddings));
    }

    let texts_imported = state.repository().add_batch(&entries)?;

    tracing::info!(%code, texts_imported, "import complete");

    Ok(Json(ImportResponse {
        message: format!(
            "Successfully imported {} legal texts for code '{}'",
            texts_imported, code
        ),
        code,
        texts_imported,
    }))
}

/// Validate the filter combination: a sub_section filter is only
/// meaningful combined with a section filter.
fn validate_filter(code: String, params: TextFilterParams) -> Result<LegalTextFilter> {
    if params.sub_section.is_some() && params.section.is_none() {
        return Err(Error::InvalidFilter(
            "sub_section filter can only be used when section filter is also provided".to_string(),
        ));
    }

    Ok(LegalTextFilter {
        code,
        section: params.section,
        sub_section: params.sub_section,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_section_without_section_is_rejected() {
        let params = TextFilterParams {
            section: None,
            sub_section: Some("1".to_string()),
        };

        let result = validate_filter("bgb".to_string(), params);
        assert!(matches!(result, Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn sub_section_with_section_is_accepted() {
        let params = TextFilterParams {
            section: Some("§ 1".to_string()),
            sub_section: Some("1".to_string()),
        };

        let filter = validate_filter("bgb".to_string(), params).unwrap();
        assert_eq!(filter.code, "bgb");
        assert_eq!(filter.section.as_deref(), Some("§ 1"));
        assert_eq!(filter.sub_section.as_deref(), Some("1"));
    }

    #[test]
    fn code_only_filter_is_accepted() {
        let filter = validate_filter("bgb".to_string(), TextFilterParams::default()).unwrap();
        assert_eq!(filter.code, "bgb");
        assert!(filter.section.is_none());
        assert!(filter.sub_section.is_none());
    }
}
