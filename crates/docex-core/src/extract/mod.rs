//! Rule-based entity extraction.

mod extractor;
pub mod matcher;
pub mod table;

pub use extractor::{Extractor, ExtractorBuilder, DEFAULT_PROFILE_NAME};
pub use matcher::{MatchFn, Matcher, Rule};

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
