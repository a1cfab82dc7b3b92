//! Row filters.

use regex::Regex;

use crate::error::ConfigError;
use crate::extract::matcher::compile_multiline;

/// Keeps a row only when the cell at `column` matches `pattern`.
#[derive(Debug, Clone)]
pub struct RowFilter {
    column: usize,
    pattern: Regex,
}

impl RowFilter {
    pub fn new(column: usize, pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            column,
            pattern: compile_multiline(pattern)?,
        })
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// A row without the target column is rejected.
    pub fn accepts(&self, row: &[String]) -> bool {
        row.get(self.column)
            .is_some_and(|cell| self.pattern.is_match(cell))
    }
}

/// True when every filter accepts the row.
pub fn accepts_all(filters: &[RowFilter], row: &[String]) -> bool {
    filters.iter().all(|filter| filter.accepts(row))
}
