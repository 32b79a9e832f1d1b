//! API routes for the legal text store server

pub mod legal_texts;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build the legal text routes, nested under
/// `/legal-texts/gesetze-im-internet`.
pub fn legal_text_routes() -> Router<AppState> {
    Router::new()
        .route("/codes", get(legal_texts::get_available_codes))
        .route("/:code", get(legal_texts::get_legal_texts))
        .route("/:code", post(legal_texts::import_legal_texts))
        .route("/:code/search", get(legal_texts::semantic_search))
}
