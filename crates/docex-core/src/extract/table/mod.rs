//! Table recognition: locate the table, split it into rows and cells, and
//! filter the rows.

mod boundary;
mod filter;
mod splitter;

pub use boundary::TableBoundary;
pub use filter::{accepts_all, RowFilter};
pub use splitter::{RowSplitter, DEFAULT_DELIMITER};

use tracing::{debug, trace, warn};

use crate::error::ExtractionError;

/// Everything needed to turn document text into table rows.
#[derive(Debug, Clone, Default)]
pub struct TableLayout {
    boundary: Option<TableBoundary>,
    splitter: RowSplitter,
    filters: Vec<RowFilter>,
}

impl TableLayout {
    pub fn new(
        boundary: Option<TableBoundary>,
        splitter: RowSplitter,
        filters: Vec<RowFilter>,
    ) -> Self {
        Self {
            boundary,
            splitter,
            filters,
        }
    }

    pub fn boundary(&self) -> Option<&TableBoundary> {
        self.boundary.as_ref()
    }

    pub fn filters(&self) -> &[RowFilter] {
        &self.filters
    }

    /// Kept rows of the document's table, as cells.
    ///
    /// A document without a table yields no rows. Blank lines inside the
    /// table are skipped. Every remaining line must split into as many
    /// cells as the first one, otherwise the whole table is rejected.
    pub fn rows(&self, text: &str) -> Result<Vec<Vec<String>>, ExtractionError> {
        let Some(table) = self.boundary.as_ref().and_then(|b| b.locate(text)) else {
            trace!("No table found in document");
            return Ok(Vec::new());
        };

        let rows: Vec<Vec<String>> = table
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| self.splitter.split(line))
            .collect();

        if let Some(first) = rows.first() {
            let expected = first.len();
            if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
                return Err(ExtractionError::RaggedTable {
                    row: index,
                    expected,
                    found: row.len(),
                });
            }

            for filter in self.filters.iter().filter(|f| f.column() >= expected) {
                warn!(
                    "Row filter on column {} is outside the table width {}, every row is dropped",
                    filter.column(),
                    expected
                );
            }
        }

        let total = rows.len();
        let kept: Vec<Vec<String>> = rows
            .into_iter()
            .filter(|row| accepts_all(&self.filters, row))
            .collect();

        debug!("Table has {} rows, {} kept after filtering", total, kept.len());
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout(filters: Vec<RowFilter>) -> TableLayout {
        TableLayout::new(
            Some(TableBoundary::new("ITEMS", false, "TOTAL", false).unwrap()),
            RowSplitter::new(",", &[]).unwrap(),
            filters,
        )
    }

    #[test]
    fn test_rows_skip_blank_lines() {
        let text = "ITEMS\nWidget,10\n\n  \nGadget,20\nTOTAL";
        assert_eq!(
            layout(vec![]).rows(text).unwrap(),
            vec![vec!["Widget", "10"], vec!["Gadget", "20"]]
        );
    }

    #[test]
    fn test_ragged_table_is_rejected() {
        let text = "ITEMS\nWidget,10\nGadget,20,extra\nTOTAL";
        let err = layout(vec![]).rows(text).unwrap_err();

        assert!(matches!(
            err,
            ExtractionError::RaggedTable { row: 1, expected: 2, found: 3 }
        ));
    }

    #[test]
    fn test_ragged_rows_are_rejected_even_if_filtered_out() {
        let text = "ITEMS\nWidget,10\nnote\nTOTAL";
        let filters = vec![RowFilter::new(1, r"\d").unwrap()];

        assert!(layout(filters).rows(text).is_err());
    }

    #[test]
    fn test_filters_drop_rows() {
        let text = "ITEMS\nName,Amount\nWidget,10\nGadget,20\nTOTAL";
        let filters = vec![RowFilter::new(1, r"^\d+$").unwrap()];

        assert_eq!(
            layout(filters).rows(text).unwrap(),
            vec![vec!["Widget", "10"], vec!["Gadget", "20"]]
        );
    }

    #[test]
    fn test_filter_past_table_width_drops_all_rows() {
        let text = "ITEMS\nWidget,10\nGadget,20\nTOTAL";
        let filters = vec![RowFilter::new(2, r".*").unwrap()];

        assert!(layout(filters).rows(text).unwrap().is_empty());
    }

    #[test]
    fn test_no_boundary_or_no_table() {
        assert!(TableLayout::default().rows("ITEMS\na,b\nTOTAL").unwrap().is_empty());
        assert!(layout(vec![]).rows("nothing to see").unwrap().is_empty());
    }
}
