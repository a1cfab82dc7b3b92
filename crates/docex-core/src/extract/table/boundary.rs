//! Locating the table substring inside the document text.

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;

const TABLE_GROUP: &str = "table";

/// Start/end markers delimiting the single table in a document.
#[derive(Debug, Clone)]
pub struct TableBoundary {
    pattern: Regex,
}

impl TableBoundary {
    /// Build a boundary from start and end patterns.
    ///
    /// Each marker is independently kept in (`inclusive`) or dropped from
    /// the located table text. The body between them is matched lazily and
    /// may span lines.
    pub fn new(
        start: &str,
        start_inclusive: bool,
        end: &str,
        end_inclusive: bool,
    ) -> Result<Self, ConfigError> {
        let head = if start_inclusive {
            format!("(?P<{TABLE_GROUP}>(?:{start})")
        } else {
            format!("(?:{start})(?P<{TABLE_GROUP}>")
        };
        let tail = if end_inclusive {
            format!("(?:{end}))")
        } else {
            format!(")(?:{end})")
        };
        let source = format!("{head}.+?{tail}");

        let pattern = RegexBuilder::new(&source)
            .multi_line(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|source_err| ConfigError::InvalidPattern {
                pattern: source,
                source: source_err,
            })?;

        Ok(Self { pattern })
    }

    /// The table text of the first boundary match, if any.
    pub fn locate<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.name(TABLE_GROUP))
            .map(|m| m.as_str())
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}
