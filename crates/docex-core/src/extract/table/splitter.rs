//! Splitting a table line into cells while keeping reserved substrings whole.

use regex::Regex;
use tracing::trace;

use crate::error::ConfigError;

/// Delimiter used when none is configured.
pub const DEFAULT_DELIMITER: &str = " ";

/// Splits one line of table text into cells.
#[derive(Debug, Clone)]
pub struct RowSplitter {
    delimiter: Regex,
    reserved: Option<Regex>,
}

impl RowSplitter {
    /// Build a splitter from a delimiter pattern and reserved-substring patterns.
    ///
    /// Reserved patterns are combined into one alternation in the given
    /// order, so the earlier pattern wins where two could match at the same
    /// position.
    pub fn new(delimiter: &str, reserved: &[String]) -> Result<Self, ConfigError> {
        let delimiter = compile(delimiter)?;
        let reserved = if reserved.is_empty() {
            None
        } else {
            let combined = reserved
                .iter()
                .map(|p| format!("(?:{p})"))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile(&combined)?)
        };

        Ok(Self { delimiter, reserved })
    }

    pub fn delimiter(&self) -> &str {
        self.delimiter.as_str()
    }

    /// Split `line` into cells.
    ///
    /// Reserved matches are kept out of the delimiter search, so the
    /// delimiter only splits the text between them. Only delimiter matches
    /// are dropped from the line.
    pub fn split(&self, line: &str) -> Vec<String> {
        let Some(reserved) = &self.reserved else {
            return self.delimiter.split(line).map(str::to_string).collect();
        };

        let mut cells = vec![String::new()];
        let mut last = 0;
        let mut protected = 0;
        for span in reserved.find_iter(line).filter(|m| !m.is_empty()) {
            self.split_gap(&mut cells, &line[last..span.start()]);
            push_to_last(&mut cells, span.as_str());
            last = span.end();
            protected += 1;
        }
        self.split_gap(&mut cells, &line[last..]);

        if protected > 0 {
            trace!("Protected {} reserved substrings in row", protected);
        }
        cells
    }

    /// The first piece continues the current cell, the rest open new ones.
    fn split_gap(&self, cells: &mut Vec<String>, gap: &str) {
        let mut pieces = self.delimiter.split(gap);
        if let Some(first) = pieces.next() {
            push_to_last(cells, first);
        }
        cells.extend(pieces.map(str::to_string));
    }
}

impl Default for RowSplitter {
    fn default() -> Self {
        Self {
            delimiter: Regex::new(DEFAULT_DELIMITER).unwrap(),
            reserved: None,
        }
    }
}

fn push_to_last(cells: &mut [String], text: &str) {
    if let Some(cell) = cells.last_mut() {
        cell.push_str(text);
    }
}

fn compile(source: &str) -> Result<Regex, ConfigError> {
    Regex::new(source).map_err(|source_err| ConfigError::InvalidPattern {
        pattern: source.to_string(),
        source: source_err,
    })
}
