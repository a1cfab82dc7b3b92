//! Entity schema: the universe of names rules may be set for.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Key under which the row list is stored in an extraction result.
pub const ROWS_KEY: &str = "rows";

/// Which half of the schema an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Scalar entities, extracted once per document.
    Document,
    /// Row entities, extracted once per kept table row.
    Row,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Document => f.write_str("document"),
            Scope::Row => f.write_str("row"),
        }
    }
}

/// Declared scalar and row entity names, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
    row_fields: Vec<String>,
}

impl Schema {
    /// Start declaring a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Scalar entity names.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Row entity names.
    pub fn row_fields(&self) -> &[String] {
        &self.row_fields
    }

    /// Names declared for `scope`.
    pub fn names(&self, scope: Scope) -> &[String] {
        match scope {
            Scope::Document => &self.fields,
            Scope::Row => &self.row_fields,
        }
    }

    pub fn contains(&self, scope: Scope, entity: &str) -> bool {
        self.names(scope).iter().any(|name| name == entity)
    }

    /// Fail unless `entity` is declared for `scope`.
    pub fn ensure(&self, scope: Scope, entity: &str) -> Result<(), ConfigError> {
        if self.contains(scope, entity) {
            Ok(())
        } else {
            Err(ConfigError::UnknownEntity {
                entity: entity.to_string(),
                scope,
            })
        }
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<String>,
    row_fields: Vec<String>,
}

impl SchemaBuilder {
    /// Declare a scalar entity.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Declare several scalar entities.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declare a row entity.
    pub fn row_field(mut self, name: impl Into<String>) -> Self {
        self.row_fields.push(name.into());
        self
    }

    /// Declare several row entities.
    pub fn row_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.row_fields.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<Schema, ConfigError> {
        if self.fields.iter().any(|name| name == ROWS_KEY) {
            return Err(ConfigError::ReservedEntity(ROWS_KEY.to_string()));
        }
        check_unique(&self.fields)?;
        check_unique(&self.row_fields)?;

        Ok(Schema {
            fields: self.fields,
            row_fields: self.row_fields,
        })
    }
}

fn check_unique(names: &[String]) -> Result<(), ConfigError> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(ConfigError::DuplicateEntity(name.clone()));
        }
    }
    Ok(())
}
