//! Choosing which configured extractor or formatter handles a document.

use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::extract::Extractor;
use crate::format::Formatter;
use crate::models::extraction::Extraction;

/// Something that can decide whether it applies to a document.
pub trait Profile {
    /// Profile name for logs and reports.
    fn name(&self) -> &str;

    /// Whether this profile should handle `text`.
    fn is_valid(&self, text: &str) -> bool;
}

impl Profile for Extractor {
    fn name(&self) -> &str {
        Extractor::name(self)
    }

    fn is_valid(&self, text: &str) -> bool {
        Extractor::is_valid(self, text)
    }
}

impl Profile for Formatter {
    fn name(&self) -> &str {
        Formatter::name(self)
    }

    fn is_valid(&self, text: &str) -> bool {
        Formatter::is_valid(self, text)
    }
}

/// First candidate valid for `text`, in the given order, else `default`.
pub fn pick_instance<'a, P: Profile>(text: &str, default: &'a P, candidates: &'a [P]) -> &'a P {
    match candidates.iter().find(|candidate| candidate.is_valid(text)) {
        Some(candidate) => {
            debug!("Selected profile {}", candidate.name());
            candidate
        }
        None => {
            debug!("No profile matched, using default {}", default.name());
            default
        }
    }
}

/// A default profile plus ordered candidates.
#[derive(Debug, Clone)]
pub struct ProfileSet<P> {
    default: P,
    candidates: Vec<P>,
}

impl<P: Profile> ProfileSet<P> {
    pub fn new(default: P) -> Self {
        Self {
            default,
            candidates: Vec::new(),
        }
    }

    /// Append a candidate. Earlier candidates win ties.
    pub fn with_candidate(mut self, candidate: P) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = P>) -> Self {
        self.candidates.extend(candidates);
        self
    }

    pub fn default_profile(&self) -> &P {
        &self.default
    }

    pub fn candidates(&self) -> &[P] {
        &self.candidates
    }

    pub fn select(&self, text: &str) -> &P {
        pick_instance(text, &self.default, &self.candidates)
    }
}

/// Output of running a document through a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct Processed {
    /// Name of the extractor profile used.
    pub extractor: String,
    /// Name of the formatter profile used.
    pub formatter: String,
    /// Values as matched.
    pub raw: Extraction,
    /// Values after formatting.
    pub formatted: Extraction,
}

/// Extractor and formatter profile groups for one kind of document.
#[derive(Debug, Clone)]
pub struct Pipeline {
    extractors: ProfileSet<Extractor>,
    formatters: ProfileSet<Formatter>,
}

impl Pipeline {
    pub fn new(extractors: ProfileSet<Extractor>, formatters: ProfileSet<Formatter>) -> Self {
        Self {
            extractors,
            formatters,
        }
    }

    /// Pipeline with a single extractor and no formatting.
    pub fn single(extractor: Extractor) -> Self {
        Self::new(ProfileSet::new(extractor), ProfileSet::new(Formatter::default()))
    }

    pub fn extractors(&self) -> &ProfileSet<Extractor> {
        &self.extractors
    }

    pub fn formatters(&self) -> &ProfileSet<Formatter> {
        &self.formatters
    }

    /// Select profiles for `text`, extract, then format.
    pub fn process(&self, text: &str) -> Result<Processed, ExtractionError> {
        let extractor = self.extractors.select(text);
        let formatter = self.formatters.select(text);

        let raw = extractor.extract(text)?;
        let formatted = formatter.format(&raw)?;

        info!(
            "Extracted {} fields and {} rows (extractor {}, formatter {})",
            raw.fields.len(),
            raw.rows.len(),
            extractor.name(),
            formatter.name()
        );

        Ok(Processed {
            extractor: extractor.name().to_string(),
            formatter: formatter.name().to_string(),
            raw,
            formatted,
        })
    }
}
