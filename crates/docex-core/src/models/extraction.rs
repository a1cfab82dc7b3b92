//! Extraction result structure.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use super::schema::ROWS_KEY;

/// An extracted entity value. `None` means the entity is absent.
pub type FieldValue = Option<Value>;

/// One table row: row entity name to value.
pub type Row = BTreeMap<String, FieldValue>;

/// Entities extracted from a single document.
///
/// Serializes as one flat object holding every scalar entity plus the
/// reserved `rows` key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Scalar entity values.
    pub fields: BTreeMap<String, FieldValue>,
    /// Per-row entity values, in table order.
    pub rows: Vec<Row>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Present value of a scalar entity.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Present value of a row entity.
    pub fn row_field(&self, row: usize, name: &str) -> Option<&Value> {
        self.rows
            .get(row)
            .and_then(|r| r.get(name))
            .and_then(Option::as_ref)
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Extraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(ROWS_KEY, &self.rows)?;
        map.end()
    }
}

/// Render a value the way it should appear in flat outputs (CSV, text).
pub fn display_value(value: &FieldValue) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_serializes_flat_with_rows() {
        let mut extraction = Extraction::new();
        extraction
            .fields
            .insert("invoice_number".to_string(), Some(json!("42")));
        extraction.fields.insert("po_number".to_string(), None);
        extraction
            .rows
            .push(Row::from([("amount".to_string(), Some(json!("10")))]));

        assert_eq!(
            extraction.to_json(),
            json!({
                "invoice_number": "42",
                "po_number": null,
                "rows": [{"amount": "10"}]
            })
        );
    }

    #[test]
    fn test_accessors_flatten_absent() {
        let mut extraction = Extraction::new();
        extraction.fields.insert("po_number".to_string(), None);

        assert_eq!(extraction.field("po_number"), None);
        assert_eq!(extraction.row_field(3, "amount"), None);
        assert_eq!(display_value(&Some(json!(12))), "12");
        assert_eq!(display_value(&None), "");
    }
}
