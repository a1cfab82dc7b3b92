//! Core library for rule-based document entity extraction.
//!
//! This crate provides:
//! - Declarative matching rules for scalar and per-row entities
//! - Table recognition with reserved-substring aware cell splitting
//! - Per-document profile selection among competing rule sets
//! - Value formatting chains and common normalizers
//! - Document text sources (plain text, PDF)

pub mod error;
pub mod extract;
pub mod format;
pub mod models;
pub mod profile;
pub mod source;

pub use error::{ConfigError, DocexError, ExtractionError, Result};
#[cfg(feature = "pdf")]
pub use error::PdfError;
pub use extract::{Extractor, ExtractorBuilder, Matcher, Rule};
pub use format::{BuiltinTransform, Formatter, FormatterBuilder, Transform};
pub use models::config::DocexConfig;
pub use models::{Extraction, FieldValue, Row, Schema, Scope};
pub use profile::{pick_instance, Pipeline, Processed, Profile, ProfileSet};
pub use source::{read_document, source_for_path, PlainTextSource, TextSource};
#[cfg(feature = "pdf")]
pub use source::PdfTextSource;
