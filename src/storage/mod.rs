//! Persistent storage for legal text records

pub mod repository;

pub use repository::LegalTextRepository;
