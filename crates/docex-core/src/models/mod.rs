//! Data models: schema, extraction results and profile files.

pub mod config;
pub mod extraction;
pub mod schema;

pub use extraction::{Extraction, FieldValue, Row};
pub use schema::{Schema, Scope};
