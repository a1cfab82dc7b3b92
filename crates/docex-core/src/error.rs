//! Error types for the docex-core library.

use thiserror::Error;

use crate::models::schema::Scope;

/// Main error type for the docex library.
#[derive(Error, Debug)]
pub enum DocexError {
    /// Text source error.
    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Per-document extraction or formatting error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Rule or profile configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported document type.
    #[error("unsupported document type: {0}")]
    UnsupportedSource(String),
}

/// Errors related to PDF text extraction.
#[cfg(feature = "pdf")]
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors raised while building rules, formatters and profiles.
///
/// These surface at setup time and are never recovered from.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A rule or flag targets a name missing from the schema.
    #[error("entity {entity} does not exist in the {scope} schema")]
    UnknownEntity { entity: String, scope: Scope },

    /// The same entity name was declared twice.
    #[error("entity {0} is declared more than once")]
    DuplicateEntity(String),

    /// A scalar entity uses the reserved row-list key.
    #[error("entity name {0} is reserved for the row list")]
    ReservedEntity(String),

    /// A pattern failed to compile.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A column matcher was registered outside the row scope.
    #[error("column matcher for {0} requires the row scope")]
    ColumnOutsideRow(String),

    /// A profile file names a profile that is not defined.
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    /// A profile file defines no profiles.
    #[error("no profiles defined")]
    NoProfiles,

    /// A profile file could not be read or parsed.
    #[error("failed to parse profile file: {0}")]
    Parse(String),
}

/// Errors raised per document while extracting or formatting.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A must-exist entity produced no value.
    #[error("entity {0} has not been extracted and is not allowed to be absent")]
    MissingEntity(String),

    /// Table rows split into different numbers of cells.
    #[error("table row {row} has {found} cells, expected {expected}")]
    RaggedTable {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A formatting transform rejected a value.
    #[error("failed to format {entity}: {reason}")]
    Format { entity: String, reason: String },
}

/// Result type for the docex library.
pub type Result<T> = std::result::Result<T, DocexError>;
