//! Post-processing of extracted values through ordered transform chains.

pub mod normalize;

pub use normalize::BuiltinTransform;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::trace;

use crate::error::{ConfigError, ExtractionError};
use crate::extract::matcher::compile_multiline;
use crate::extract::DEFAULT_PROFILE_NAME;
use crate::models::extraction::{Extraction, FieldValue};
use crate::models::schema::Scope;

/// Function behind a [`Transform`].
pub type TransformFn = dyn Fn(FieldValue) -> Result<FieldValue, String> + Send + Sync;

/// A named value transform.
#[derive(Clone)]
pub struct Transform {
    name: String,
    func: Arc<TransformFn>,
}

impl Transform {
    /// Transform that also sees absent values.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(FieldValue) -> Result<FieldValue, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(f),
        }
    }

    /// Transform of present values; absent values pass through untouched.
    pub fn map<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::new(name, move |value: FieldValue| value.map(&f).transpose())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, value: FieldValue) -> Result<FieldValue, String> {
        (self.func)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transform").field(&self.name).finish()
    }
}

impl From<BuiltinTransform> for Transform {
    fn from(builtin: BuiltinTransform) -> Self {
        builtin.transform()
    }
}

/// Chains and absent-value whitelist for one scope.
#[derive(Debug, Clone, Default)]
struct ChainSet {
    chains: HashMap<String, Vec<Transform>>,
    format_when_absent: HashSet<String>,
}

impl ChainSet {
    fn run(&self, entity: &str, value: &FieldValue) -> Result<Option<FieldValue>, ExtractionError> {
        let Some(chain) = self.chains.get(entity) else {
            return Ok(None);
        };
        if value.is_none() && !self.format_when_absent.contains(entity) {
            return Ok(None);
        }

        let mut current = value.clone();
        for transform in chain {
            current = transform
                .apply(current)
                .map_err(|reason| ExtractionError::Format {
                    entity: entity.to_string(),
                    reason: format!("{}: {}", transform.name(), reason),
                })?;
        }
        trace!("Formatted {} through {} transforms", entity, chain.len());
        Ok(Some(current))
    }
}

/// Configures a [`Formatter`].
#[derive(Debug, Clone)]
pub struct FormatterBuilder {
    name: String,
    fields: ChainSet,
    rows: ChainSet,
    validity: Option<Regex>,
}

impl FormatterBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            fields: ChainSet::default(),
            rows: ChainSet::default(),
            validity: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Register `chain` for each of `entities` in `scope`, replacing any
    /// earlier chain for those names.
    ///
    /// With `format_when_absent` the chain also runs on absent values.
    pub fn formatters<I, S>(
        mut self,
        entities: I,
        chain: Vec<Transform>,
        scope: Scope,
        format_when_absent: bool,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = match scope {
            Scope::Document => &mut self.fields,
            Scope::Row => &mut self.rows,
        };
        for entity in entities {
            let entity = entity.into();
            if format_when_absent {
                set.format_when_absent.insert(entity.clone());
            }
            set.chains.insert(entity, chain.clone());
        }
        self
    }

    /// Pattern deciding whether this formatter applies to a document.
    pub fn validity_check(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.validity = Some(compile_multiline(pattern)?);
        Ok(self)
    }

    pub fn build(self) -> Formatter {
        Formatter { inner: self }
    }
}

impl Default for FormatterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies transform chains to extraction results.
#[derive(Debug, Clone)]
pub struct Formatter {
    inner: FormatterBuilder,
}

impl Formatter {
    pub fn builder() -> FormatterBuilder {
        FormatterBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn to_builder(&self) -> FormatterBuilder {
        self.inner.clone()
    }

    /// True when the validity check is set and matches `text`.
    pub fn is_valid(&self, text: &str) -> bool {
        self.inner
            .validity
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }

    /// Return a formatted copy of `extraction`.
    pub fn format(&self, extraction: &Extraction) -> Result<Extraction, ExtractionError> {
        let mut formatted = extraction.clone();

        for (entity, value) in formatted.fields.iter_mut() {
            if let Some(new_value) = self.inner.fields.run(entity, value)? {
                *value = new_value;
            }
        }

        for row in formatted.rows.iter_mut() {
            for (entity, value) in row.iter_mut() {
                if let Some(new_value) = self.inner.rows.run(entity, value)? {
                    *value = new_value;
                }
            }
        }

        Ok(formatted)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        FormatterBuilder::new().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::extraction::Row;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn extraction() -> Extraction {
        let mut extraction = Extraction::new();
        extraction.fields.insert("total".to_string(), Some(json!(" $1,200.00 ")));
        extraction.fields.insert("due".to_string(), None);
        extraction.rows.push(Row::from([
            ("amount".to_string(), Some(json!("10.00"))),
            ("note".to_string(), None),
        ]));
        extraction.rows.push(Row::from([
            ("amount".to_string(), Some(json!("20.50"))),
            ("note".to_string(), Some(json!("rush"))),
        ]));
        extraction
    }

    fn append(suffix: &'static str) -> Transform {
        Transform::map(suffix, move |v| Ok(json!(format!("{}{}", v.as_str().unwrap_or(""), suffix))))
    }

    #[test]
    fn test_chain_applies_in_order() {
        let formatter = Formatter::builder()
            .formatters(["total"], vec![append("a"), append("b")], Scope::Document, false)
            .build();

        let formatted = formatter.format(&extraction()).unwrap();
        assert_eq!(formatted.field("total"), Some(&json!(" $1,200.00 ab")));
    }

    #[test]
    fn test_builtin_chain() {
        let formatter = Formatter::builder()
            .formatters(
                ["total"],
                vec![BuiltinTransform::Trim.into(), BuiltinTransform::StripNumber.into()],
                Scope::Document,
                false,
            )
            .formatters(["amount"], vec![BuiltinTransform::Decimal.into()], Scope::Row, false)
            .build();

        let formatted = formatter.format(&extraction()).unwrap();
        assert_eq!(formatted.field("total"), Some(&json!(120000)));
        assert_eq!(formatted.row_field(0, "amount"), Some(&json!("10.00")));
        assert_eq!(formatted.row_field(1, "amount"), Some(&json!("20.50")));
    }

    #[test]
    fn test_absent_values_skip_unless_whitelisted() {
        let fill = Transform::new("fill", |v: FieldValue| Ok(v.or(Some(json!("n/a")))));

        let skipping = Formatter::builder()
            .formatters(["due"], vec![fill.clone()], Scope::Document, false)
            .formatters(["note"], vec![fill.clone()], Scope::Row, false)
            .build();
        let formatted = skipping.format(&extraction()).unwrap();
        assert_eq!(formatted.fields["due"], None);
        assert_eq!(formatted.rows[0]["note"], None);

        let whitelisted = Formatter::builder()
            .formatters(["due"], vec![fill.clone()], Scope::Document, true)
            .formatters(["note"], vec![fill], Scope::Row, true)
            .build();
        let formatted = whitelisted.format(&extraction()).unwrap();
        assert_eq!(formatted.field("due"), Some(&json!("n/a")));
        assert_eq!(formatted.row_field(0, "note"), Some(&json!("n/a")));
        assert_eq!(formatted.row_field(1, "note"), Some(&json!("rush")));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let original = extraction();
        let formatter = Formatter::builder()
            .formatters(["total"], vec![BuiltinTransform::Trim.into()], Scope::Document, false)
            .build();

        let formatted = formatter.format(&original).unwrap();
        assert_eq!(original, extraction());
        assert_ne!(formatted, original);
    }

    #[test]
    fn test_transform_failure_names_entity() {
        let formatter = Formatter::builder()
            .formatters(["amount"], vec![BuiltinTransform::Date.into()], Scope::Row, false)
            .build();

        let err = formatter.format(&extraction()).unwrap_err();
        assert!(matches!(err, ExtractionError::Format { entity, .. } if entity == "amount"));
    }

    #[test]
    fn test_reregistering_replaces_chain() {
        let formatter = Formatter::builder()
            .formatters(["total"], vec![append("x")], Scope::Document, false)
            .formatters(["total"], vec![append("y")], Scope::Document, false)
            .build();

        let formatted = formatter.format(&extraction()).unwrap();
        assert_eq!(formatted.field("total"), Some(&json!(" $1,200.00 y")));
    }
}
