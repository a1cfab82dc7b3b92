//! Matching strategies that turn document text (and optionally a table row)
//! into one entity value.

use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::error::{ConfigError, ExtractionError};
use crate::models::extraction::FieldValue;

/// Caller-supplied matching logic. Receives the full document text.
pub type MatchFn = dyn Fn(&str) -> FieldValue + Send + Sync;

/// Strategy for extracting a single value.
#[derive(Clone)]
pub enum Matcher {
    /// First capture group of the first match in the text.
    Pattern(Regex),
    /// Cell at this index of the current table row.
    Column(usize),
    /// Fixed value, input is ignored.
    Constant(Value),
    /// Arbitrary function of the text.
    Callback(Arc<MatchFn>),
}

impl Matcher {
    /// Compile a pattern matcher. `^` and `$` match at line boundaries.
    pub fn pattern(source: &str) -> Result<Self, ConfigError> {
        compile_multiline(source).map(Matcher::Pattern)
    }

    pub fn column(index: usize) -> Self {
        Matcher::Column(index)
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Matcher::Constant(value.into())
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&str) -> FieldValue + Send + Sync + 'static,
    {
        Matcher::Callback(Arc::new(f))
    }

    /// Run the strategy without must-exist validation.
    ///
    /// A column matcher given no row, or a row shorter than its index,
    /// yields absent.
    pub fn find(&self, text: &str, row: Option<&[String]>) -> FieldValue {
        match self {
            Matcher::Pattern(re) => {
                let caps = re.captures(text)?;
                let group = if caps.len() > 1 { caps.get(1) } else { caps.get(0) };
                group.map(|m| Value::String(m.as_str().to_string()))
            }
            Matcher::Column(index) => row
                .and_then(|cells| cells.get(*index))
                .map(|cell| Value::String(cell.clone())),
            Matcher::Constant(value) => Some(value.clone()),
            Matcher::Callback(f) => f(text),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Matcher::Column(index) => f.debug_tuple("Column").field(index).finish(),
            Matcher::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Matcher::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A matcher bound to an entity name.
#[derive(Debug, Clone)]
pub struct Rule {
    entity: String,
    matcher: Matcher,
    must_exist: bool,
}

impl Rule {
    pub fn new(entity: impl Into<String>, matcher: Matcher, must_exist: bool) -> Self {
        Self {
            entity: entity.into(),
            matcher,
            must_exist,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn must_exist(&self) -> bool {
        self.must_exist
    }

    /// Run the matcher and enforce the must-exist flag.
    pub fn apply(&self, text: &str, row: Option<&[String]>) -> Result<FieldValue, ExtractionError> {
        let value = self.matcher.find(text, row);
        if value.is_none() && self.must_exist {
            return Err(ExtractionError::MissingEntity(self.entity.clone()));
        }
        Ok(value)
    }
}

pub(crate) fn compile_multiline(source: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(source)
        .multi_line(true)
        .build()
        .map_err(|source_err| ConfigError::InvalidPattern {
            pattern: source.to_string(),
            source: source_err,
        })
}
