//! Rule registry and extraction of entities from document text.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, trace};

use super::matcher::{compile_multiline, Matcher, Rule};
use super::table::{RowFilter, RowSplitter, TableBoundary, TableLayout, DEFAULT_DELIMITER};
use super::Result;
use crate::error::ConfigError;
use crate::models::extraction::{Extraction, Row};
use crate::models::schema::{Schema, Scope};

/// Name given to extractors that were not explicitly named.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Configures an [`Extractor`].
///
/// Every setter consumes the builder and returns it, failing with a
/// [`ConfigError`] when it names an entity missing from the schema or
/// carries a pattern that does not compile.
#[derive(Debug, Clone)]
pub struct ExtractorBuilder {
    name: String,
    schema: Arc<Schema>,
    rules: HashMap<String, Matcher>,
    row_rules: HashMap<String, Matcher>,
    must_exist: HashSet<String>,
    row_must_exist: HashSet<String>,
    delimiter: String,
    boundary: Option<TableBoundary>,
    reserved: Vec<String>,
    filters: Vec<RowFilter>,
    validity: Option<Regex>,
}

impl ExtractorBuilder {
    /// Start configuring an extractor for `schema`.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            schema: schema.into(),
            rules: HashMap::new(),
            row_rules: HashMap::new(),
            must_exist: HashSet::new(),
            row_must_exist: HashSet::new(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            boundary: None,
            reserved: Vec::new(),
            filters: Vec::new(),
            validity: None,
        }
    }

    /// Name used in logs and profile selection reports.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bind `matcher` to `entity` in `scope`, replacing any earlier rule.
    ///
    /// In the row scope a [`Matcher::Column`] reads from the table row and
    /// every other matcher reads from the whole document.
    pub fn set_rule(
        mut self,
        scope: Scope,
        entity: impl Into<String>,
        matcher: Matcher,
    ) -> std::result::Result<Self, ConfigError> {
        let entity = entity.into();
        self.schema.ensure(scope, &entity)?;

        match scope {
            Scope::Document => {
                if matches!(matcher, Matcher::Column(_)) {
                    return Err(ConfigError::ColumnOutsideRow(entity));
                }
                self.rules.insert(entity, matcher);
            }
            Scope::Row => {
                self.row_rules.insert(entity, matcher);
            }
        }
        Ok(self)
    }

    /// Bind a scalar entity.
    pub fn rule(
        self,
        entity: impl Into<String>,
        matcher: Matcher,
    ) -> std::result::Result<Self, ConfigError> {
        self.set_rule(Scope::Document, entity, matcher)
    }

    /// Bind a row entity.
    pub fn row_rule(
        self,
        entity: impl Into<String>,
        matcher: Matcher,
    ) -> std::result::Result<Self, ConfigError> {
        self.set_rule(Scope::Row, entity, matcher)
    }

    /// Require the given entities to be present in every document.
    pub fn must_exist<I, S>(mut self, entities: I, scope: Scope) -> std::result::Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for entity in entities {
            let entity = entity.into();
            self.schema.ensure(scope, &entity)?;
            self.required_mut(scope).insert(entity);
        }
        Ok(self)
    }

    /// Require every entity of `scope`.
    pub fn must_exist_all(mut self, scope: Scope) -> Self {
        let names: Vec<String> = self.schema.names(scope).to_vec();
        self.required_mut(scope).extend(names);
        self
    }

    /// Pattern separating cells within a table line.
    pub fn row_delimiter(mut self, pattern: &str) -> std::result::Result<Self, ConfigError> {
        RowSplitter::new(pattern, &[])?;
        self.delimiter = pattern.to_string();
        Ok(self)
    }

    /// Markers locating the table in the document.
    pub fn table_boundary(
        mut self,
        start: &str,
        start_inclusive: bool,
        end: &str,
        end_inclusive: bool,
    ) -> std::result::Result<Self, ConfigError> {
        self.boundary = Some(TableBoundary::new(start, start_inclusive, end, end_inclusive)?);
        Ok(self)
    }

    /// Substrings that must never be split into separate cells.
    ///
    /// Patterns accumulate across calls; earlier patterns take precedence.
    pub fn reserved_cell_patterns<I, S>(mut self, patterns: I) -> std::result::Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            let pattern = pattern.into();
            Regex::new(&pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            self.reserved.push(pattern);
        }
        Ok(self)
    }

    /// Keep only rows whose cell at `column` matches `pattern`.
    ///
    /// Filters accumulate; a row must pass all of them.
    pub fn row_filter(mut self, column: usize, pattern: &str) -> std::result::Result<Self, ConfigError> {
        self.filters.push(RowFilter::new(column, pattern)?);
        Ok(self)
    }

    /// Pattern deciding whether this extractor applies to a document.
    pub fn validity_check(mut self, pattern: &str) -> std::result::Result<Self, ConfigError> {
        self.validity = Some(compile_multiline(pattern)?);
        Ok(self)
    }

    /// Freeze the configuration.
    pub fn build(self) -> std::result::Result<Extractor, ConfigError> {
        let splitter = RowSplitter::new(&self.delimiter, &self.reserved)?;
        let rules = freeze_rules(&self.schema, Scope::Document, &self.rules, &self.must_exist);
        let row_rules = freeze_rules(&self.schema, Scope::Row, &self.row_rules, &self.row_must_exist);

        debug!(
            "Built extractor {} with {} rules and {} row rules",
            self.name,
            self.rules.len(),
            self.row_rules.len()
        );

        Ok(Extractor {
            layout: TableLayout::new(self.boundary.clone(), splitter, self.filters.clone()),
            rules,
            row_rules,
            source: self,
        })
    }

    fn required_mut(&mut self, scope: Scope) -> &mut HashSet<String> {
        match scope {
            Scope::Document => &mut self.must_exist,
            Scope::Row => &mut self.row_must_exist,
        }
    }
}

/// One slot per schema entity, in schema order. Entities without a rule
/// still get a slot and always yield absent.
fn freeze_rules(
    schema: &Schema,
    scope: Scope,
    matchers: &HashMap<String, Matcher>,
    required: &HashSet<String>,
) -> Vec<(String, Option<Rule>)> {
    schema
        .names(scope)
        .iter()
        .map(|name| {
            let rule = matchers
                .get(name)
                .map(|m| Rule::new(name.clone(), m.clone(), required.contains(name)));
            (name.clone(), rule)
        })
        .collect()
}

/// A frozen set of extraction rules.
///
/// Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Vec<(String, Option<Rule>)>,
    row_rules: Vec<(String, Option<Rule>)>,
    layout: TableLayout,
    source: ExtractorBuilder,
}

impl Extractor {
    pub fn builder(schema: impl Into<Arc<Schema>>) -> ExtractorBuilder {
        ExtractorBuilder::new(schema)
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn schema(&self) -> &Schema {
        &self.source.schema
    }

    /// Rule bound to a scalar entity, if any.
    pub fn rule(&self, entity: &str) -> Option<&Rule> {
        find_rule(&self.rules, entity)
    }

    /// Rule bound to a row entity, if any.
    pub fn row_rule(&self, entity: &str) -> Option<&Rule> {
        find_rule(&self.row_rules, entity)
    }

    /// Continue configuring from this extractor's rules, e.g. to derive a
    /// variant profile that overrides a few of them.
    pub fn to_builder(&self) -> ExtractorBuilder {
        self.source.clone()
    }

    /// True when the validity check is set and matches `text`.
    pub fn is_valid(&self, text: &str) -> bool {
        self.source
            .validity
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }

    /// Extract every scalar and row entity from `text`.
    pub fn extract(&self, text: &str) -> Result<Extraction> {
        let mut extraction = Extraction::new();

        for (name, rule) in &self.rules {
            let value = match rule {
                Some(rule) => rule.apply(text, None)?,
                None => None,
            };
            extraction.fields.insert(name.clone(), value);
        }

        for cells in self.layout.rows(text)? {
            let mut row = Row::new();
            for (name, rule) in &self.row_rules {
                let value = match rule {
                    Some(rule) => rule.apply(text, Some(&cells))?,
                    None => None,
                };
                row.insert(name.clone(), value);
            }
            extraction.rows.push(row);
        }

        trace!(
            "Extractor {} produced {} fields and {} rows",
            self.name(),
            extraction.fields.len(),
            extraction.rows.len()
        );
        Ok(extraction)
    }
}

fn find_rule<'a>(rules: &'a [(String, Option<Rule>)], entity: &str) -> Option<&'a Rule> {
    rules
        .iter()
        .find(|(name, _)| name == entity)
        .and_then(|(_, rule)| rule.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const INVOICE: &str = "Invoice #42\nITEMS\nWidget,10\nGadget,20\nTOTAL";

    fn schema() -> Schema {
        Schema::builder()
            .fields(["invoice_number", "po_number", "currency"])
            .row_fields(["description", "amount"])
            .build()
            .unwrap()
    }

    fn invoice_extractor() -> ExtractorBuilder {
        Extractor::builder(schema())
            .rule("invoice_number", Matcher::pattern(r"Invoice #(\d+)").unwrap())
            .unwrap()
            .table_boundary("ITEMS", false, "TOTAL", false)
            .unwrap()
            .row_delimiter(",")
            .unwrap()
            .row_rule("amount", Matcher::column(1))
            .unwrap()
    }

    #[test]
    fn test_end_to_end_invoice() {
        let extractor = invoice_extractor().build().unwrap();
        let extraction = extractor.extract(INVOICE).unwrap();

        assert_eq!(
            extraction.to_json(),
            json!({
                "invoice_number": "42",
                "po_number": null,
                "currency": null,
                "rows": [
                    {"description": null, "amount": "10"},
                    {"description": null, "amount": "20"}
                ]
            })
        );
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let err = Extractor::builder(schema())
            .rule("vendor", Matcher::constant("ACME"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEntity { scope: Scope::Document, .. }));

        let err = Extractor::builder(schema())
            .row_rule("invoice_number", Matcher::column(0))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEntity { scope: Scope::Row, .. }));
    }

    #[test]
    fn test_column_matcher_needs_row_scope() {
        let err = Extractor::builder(schema())
            .rule("currency", Matcher::column(0))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ColumnOutsideRow(_)));
    }

    #[test]
    fn test_missing_optional_entity_is_absent() {
        let extractor = invoice_extractor()
            .rule("po_number", Matcher::pattern(r"PO (\d+)").unwrap())
            .unwrap()
            .build()
            .unwrap();

        let extraction = extractor.extract(INVOICE).unwrap();
        assert_eq!(extraction.fields["po_number"], None);
    }

    #[test]
    fn test_must_exist_aborts_extraction() {
        // Flags apply regardless of whether they are set before or after the rule.
        let extractor = Extractor::builder(schema())
            .must_exist(["po_number"], Scope::Document)
            .unwrap()
            .rule("po_number", Matcher::pattern(r"PO (\d+)").unwrap())
            .unwrap()
            .build()
            .unwrap();

        let err = extractor.extract(INVOICE).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingEntity(name) if name == "po_number"));
        assert!(extractor.extract("PO 9").is_ok());
    }

    #[test]
    fn test_must_exist_rejects_unknown_names() {
        assert!(Extractor::builder(schema())
            .must_exist(["nope"], Scope::Row)
            .is_err());
    }

    #[test]
    fn test_must_exist_all_rows() {
        let extractor = invoice_extractor()
            .row_rule("description", Matcher::column(3))
            .unwrap()
            .must_exist_all(Scope::Row)
            .build()
            .unwrap();

        let err = extractor.extract(INVOICE).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingEntity(name) if name == "description"));

        // Entities without a rule stay absent even when required.
        let extractor = invoice_extractor().must_exist_all(Scope::Row).build().unwrap();
        assert_eq!(extractor.extract(INVOICE).unwrap().rows.len(), 2);
    }

    #[test]
    fn test_row_rules_can_read_outside_table() {
        let extractor = invoice_extractor()
            .row_rule("description", Matcher::pattern(r"Invoice #(\d+)").unwrap())
            .unwrap()
            .build()
            .unwrap();

        let extraction = extractor.extract(INVOICE).unwrap();
        assert_eq!(extraction.row_field(0, "description"), Some(&json!("42")));
        assert_eq!(extraction.row_field(1, "description"), Some(&json!("42")));
    }

    #[test]
    fn test_document_without_table_has_no_rows() {
        let extractor = invoice_extractor().build().unwrap();
        let extraction = extractor.extract("Invoice #7\nno items").unwrap();

        assert_eq!(extraction.field("invoice_number"), Some(&json!("7")));
        assert!(extraction.rows.is_empty());
    }

    #[test]
    fn test_ragged_table_fails_whole_document() {
        let extractor = invoice_extractor().build().unwrap();
        let err = extractor
            .extract("Invoice #1\nITEMS\nWidget,10\nGadget\nTOTAL")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::RaggedTable { .. }));
    }

    #[test]
    fn test_reserved_patterns_and_filters() {
        let text = "ITEMS\nDescription,Amount\nWidget,1,234\nShipping,5\nTOTAL";
        let extractor = invoice_extractor()
            .reserved_cell_patterns([r"\d{1,3}(,\d{3})+"])
            .unwrap()
            .row_filter(1, r"^[\d,]+$")
            .unwrap()
            .row_rule("description", Matcher::column(0))
            .unwrap()
            .build()
            .unwrap();

        let extraction = extractor.extract(text).unwrap();
        assert_eq!(extraction.rows.len(), 2);
        assert_eq!(extraction.row_field(0, "amount"), Some(&json!("1,234")));
        assert_eq!(extraction.row_field(1, "description"), Some(&json!("Shipping")));
    }

    #[test]
    fn test_adding_filters_never_grows_rows() {
        let text = "ITEMS\nA,1\nB,x\nc,2\nTOTAL";
        let base = invoice_extractor();
        let one = base.clone().row_filter(1, r"^\d$").unwrap();
        let two = one.clone().row_filter(0, r"^[A-Z]$").unwrap();

        let counts: Vec<usize> = [base, one, two]
            .into_iter()
            .map(|b| b.build().unwrap().extract(text).unwrap().rows.len())
            .collect();
        assert_eq!(counts, vec![3, 2, 1]);
    }

    #[test]
    fn test_rule_overwrite_and_derived_profile() {
        let base = invoice_extractor()
            .rule("currency", Matcher::constant("USD"))
            .unwrap()
            .build()
            .unwrap();
        let derived = base
            .to_builder()
            .named("euro")
            .rule("currency", Matcher::constant("EUR"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(base.extract(INVOICE).unwrap().field("currency"), Some(&json!("USD")));
        assert_eq!(derived.extract(INVOICE).unwrap().field("currency"), Some(&json!("EUR")));
        assert_eq!(derived.name(), "euro");
        assert_eq!(derived.extract(INVOICE).unwrap().rows.len(), 2);
    }

    #[test]
    fn test_callback_rule() {
        let extractor = Extractor::builder(schema())
            .rule(
                "currency",
                Matcher::callback(|text| text.contains('€').then(|| json!("EUR"))),
            )
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(extractor.extract("Total 5 €").unwrap().field("currency"), Some(&json!("EUR")));
        assert_eq!(extractor.extract("Total 5").unwrap().field("currency"), None);
    }

    #[test]
    fn test_validity_check() {
        let unchecked = invoice_extractor().build().unwrap();
        let checked = invoice_extractor().validity_check(r"^Invoice #").unwrap().build().unwrap();

        assert!(!unchecked.is_valid(INVOICE));
        assert!(checked.is_valid(INVOICE));
        assert!(!checked.is_valid("Receipt"));
    }

    #[test]
    fn test_extractor_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extractor>();

        let extractor = Arc::new(invoice_extractor().build().unwrap());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let extractor = Arc::clone(&extractor);
                std::thread::spawn(move || {
                    let text = format!("Invoice #{i}\nITEMS\nA,1\nTOTAL");
                    extractor.extract(&text).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let extraction = handle.join().unwrap();
            assert_eq!(extraction.field("invoice_number"), Some(&json!(i.to_string())));
        }
    }
}
