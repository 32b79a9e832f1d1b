//! Core types for the legal text store

pub mod legal_text;
pub mod response;

pub use legal_text::{LegalText, LegalTextFilter, LegalTextRecord};
pub use response::{CodesResponse, ImportResponse, LegalTextsResponse, SearchHit, SearchResponse};
