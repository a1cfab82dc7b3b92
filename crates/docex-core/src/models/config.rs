//! Profile files: a JSON description of a schema and its extraction profiles.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ConfigError;
use crate::extract::{Extractor, ExtractorBuilder, Matcher};
use crate::format::{BuiltinTransform, Formatter, FormatterBuilder, Transform};
use crate::models::schema::{Schema, Scope};
use crate::profile::{Pipeline, ProfileSet};

/// Top-level profile file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocexConfig {
    /// Entity names shared by every profile.
    pub schema: SchemaConfig,

    /// Profiles in selection priority order.
    pub profiles: Vec<ProfileConfig>,

    /// Profile used when no validity check matches (default: the first).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
}

/// Entity names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Scalar entities.
    pub fields: Vec<String>,

    /// Per-row entities.
    pub row_fields: Vec<String>,
}

/// One extraction profile and its formatting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub name: String,

    /// Pattern selecting this profile for a document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_check: Option<String>,

    /// Scalar entity rules.
    pub rules: Vec<RuleConfig>,

    /// Row entity rules.
    pub row_rules: Vec<RuleConfig>,

    /// Scalar entities that must be present.
    pub must_exist: Vec<String>,

    /// Row entities that must be present in every row.
    pub row_must_exist: Vec<String>,

    /// Table recognition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableConfig>,

    /// Formatting chains.
    pub formatters: Vec<FormatterConfig>,
}

/// An entity bound to a matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub entity: String,

    #[serde(flatten)]
    pub matcher: MatcherConfig,
}

/// Matchers expressible in a file. Callbacks need code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherConfig {
    Pattern(String),
    Column(usize),
    Constant(Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Cell delimiter pattern (default: a single space).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryConfig>,

    /// Substrings never split into cells.
    pub reserved_cell_patterns: Vec<String>,

    /// Row filters, all of which must pass.
    pub filters: Vec<FilterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConfig {
    pub start: String,
    #[serde(default)]
    pub start_inclusive: bool,
    pub end: String,
    #[serde(default)]
    pub end_inclusive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub column: usize,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub entities: Vec<String>,
    pub chain: Vec<BuiltinTransform>,

    /// Apply to row entities instead of scalar ones.
    #[serde(default)]
    pub rows: bool,

    /// Run the chain on absent values too.
    #[serde(default)]
    pub format_when_absent: bool,
}

impl MatcherConfig {
    fn to_matcher(&self) -> Result<Matcher, ConfigError> {
        match self {
            MatcherConfig::Pattern(source) => Matcher::pattern(source),
            MatcherConfig::Column(index) => Ok(Matcher::column(*index)),
            MatcherConfig::Constant(value) => Ok(Matcher::constant(value.clone())),
        }
    }
}

impl ProfileConfig {
    /// Build this profile's extractor for `schema`.
    pub fn build_extractor(&self, schema: Arc<Schema>) -> Result<Extractor, ConfigError> {
        let mut builder = ExtractorBuilder::new(schema).named(&self.name);

        for rule in &self.rules {
            builder = builder.rule(&rule.entity, rule.matcher.to_matcher()?)?;
        }
        for rule in &self.row_rules {
            builder = builder.row_rule(&rule.entity, rule.matcher.to_matcher()?)?;
        }
        builder = builder
            .must_exist(&self.must_exist, Scope::Document)?
            .must_exist(&self.row_must_exist, Scope::Row)?;

        if let Some(table) = &self.table {
            if let Some(delimiter) = &table.delimiter {
                builder = builder.row_delimiter(delimiter)?;
            }
            if let Some(b) = &table.boundary {
                builder = builder.table_boundary(&b.start, b.start_inclusive, &b.end, b.end_inclusive)?;
            }
            builder = builder.reserved_cell_patterns(&table.reserved_cell_patterns)?;
            for filter in &table.filters {
                builder = builder.row_filter(filter.column, &filter.pattern)?;
            }
        }

        if let Some(pattern) = &self.validity_check {
            builder = builder.validity_check(pattern)?;
        }

        builder.build()
    }

    /// Build this profile's formatter.
    pub fn build_formatter(&self) -> Result<Formatter, ConfigError> {
        let mut builder = FormatterBuilder::new().named(&self.name);

        for formatter in &self.formatters {
            let chain: Vec<Transform> = formatter.chain.iter().map(|b| b.transform()).collect();
            let scope = if formatter.rows { Scope::Row } else { Scope::Document };
            builder = builder.formatters(&formatter.entities, chain, scope, formatter.format_when_absent);
        }

        if let Some(pattern) = &self.validity_check {
            builder = builder.validity_check(pattern)?;
        }

        Ok(builder.build())
    }
}

impl DocexConfig {
    /// Load a profile file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn build_schema(&self) -> Result<Schema, ConfigError> {
        Schema::builder()
            .fields(self.schema.fields.iter().cloned())
            .row_fields(self.schema.row_fields.iter().cloned())
            .build()
    }

    /// Build every profile into a selection pipeline.
    ///
    /// The default profile is the one named by `default_profile`, or the
    /// first profile; all other profiles become candidates in file order.
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigError> {
        if self.profiles.is_empty() {
            return Err(ConfigError::NoProfiles);
        }
        let schema = Arc::new(self.build_schema()?);

        let default_index = match &self.default_profile {
            Some(name) => self
                .profiles
                .iter()
                .position(|p| &p.name == name)
                .ok_or_else(|| ConfigError::UnknownProfile(name.clone()))?,
            None => 0,
        };

        let mut extractors = Vec::with_capacity(self.profiles.len());
        let mut formatters = Vec::with_capacity(self.profiles.len());
        for profile in &self.profiles {
            extractors.push(profile.build_extractor(Arc::clone(&schema))?);
            formatters.push(profile.build_formatter()?);
        }

        let default_extractor = extractors.remove(default_index);
        let default_formatter = formatters.remove(default_index);

        debug!(
            "Built pipeline with default profile {} and {} candidates",
            default_extractor.name(),
            extractors.len()
        );

        Ok(Pipeline::new(
            ProfileSet::new(default_extractor).with_candidates(extractors),
            ProfileSet::new(default_formatter).with_candidates(formatters),
        ))
    }

    /// A small working invoice profile file.
    pub fn sample() -> Self {
        let rule = |entity: &str, matcher: MatcherConfig| RuleConfig {
            entity: entity.to_string(),
            matcher,
        };

        let invoice = ProfileConfig {
            name: "invoice".to_string(),
            validity_check: Some(r"^Invoice #\d+".to_string()),
            rules: vec![
                rule("invoice_number", MatcherConfig::Pattern(r"Invoice #(\d+)".to_string())),
                rule("issue_date", MatcherConfig::Pattern(r"^Date: (.+)$".to_string())),
                rule("total", MatcherConfig::Pattern(r"^TOTAL\s+(\S+)".to_string())),
                rule("currency", MatcherConfig::Constant(Value::from("USD"))),
            ],
            row_rules: vec![
                rule("description", MatcherConfig::Column(0)),
                rule("amount", MatcherConfig::Column(1)),
            ],
            must_exist: vec!["invoice_number".to_string()],
            row_must_exist: vec![],
            table: Some(TableConfig {
                delimiter: Some(r"\s*,\s*".to_string()),
                boundary: Some(BoundaryConfig {
                    start: r"^ITEMS$".to_string(),
                    start_inclusive: false,
                    end: r"^TOTAL".to_string(),
                    end_inclusive: false,
                }),
                reserved_cell_patterns: vec![r"\d{1,3}(,\d{3})+(\.\d+)?".to_string()],
                filters: vec![FilterConfig {
                    column: 1,
                    pattern: r"\d".to_string(),
                }],
            }),
            formatters: vec![
                FormatterConfig {
                    entities: vec!["issue_date".to_string()],
                    chain: vec![BuiltinTransform::Trim, BuiltinTransform::Date],
                    rows: false,
                    format_when_absent: false,
                },
                FormatterConfig {
                    entities: vec!["total".to_string()],
                    chain: vec![BuiltinTransform::Decimal],
                    rows: false,
                    format_when_absent: false,
                },
                FormatterConfig {
                    entities: vec!["amount".to_string()],
                    chain: vec![BuiltinTransform::Decimal],
                    rows: true,
                    format_when_absent: false,
                },
            ],
        };

        let mut euro = invoice.clone();
        euro.name = "invoice-eur".to_string();
        euro.validity_check = Some("€".to_string());
        euro.rules[3] = rule("currency", MatcherConfig::Constant(Value::from("EUR")));

        Self {
            schema: SchemaConfig {
                fields: ["invoice_number", "issue_date", "total", "currency"]
                    .map(String::from)
                    .to_vec(),
                row_fields: ["description", "amount"].map(String::from).to_vec(),
            },
            profiles: vec![euro, invoice],
            default_profile: Some("invoice".to_string()),
        }
    }
}
