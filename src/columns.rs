//! Column descriptors: the declarative mapping between client output keys and store fields.
//!
//! A descriptor is resolved by presence-check: the optional relation, filter and formatter
//! each switch on a capability without any further type inspection.
//!
//! ```rust,ignore
//! let columns = ColumnRegistry::new(vec![
//!     ColumnDescriptor::new("name", "name"),
//!     ColumnDescriptor::new("age", "age").formatter(|value, _row| json!(format!("{value} y"))),
//!     ColumnDescriptor::new("department", "name").relation("department"),
//! ])?;
//! ```

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::errors::GridError;
use crate::filtering::Predicate;

/// A raw result row keyed by source field. Related rows are nested objects keyed by
/// relation name.
pub type Row = serde_json::Map<String, Value>;

/// Custom filter: `(source_field, search_term) -> Predicate`
pub type FilterFn = Arc<dyn Fn(&str, &str) -> Predicate + Send + Sync>;

/// Custom formatter: `(raw_value, row_or_related_row) -> output value`
pub type FormatterFn = Arc<dyn Fn(&Value, &Row) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct ColumnDescriptor {
    output_key: String,
    source_field: Option<String>,
    relation: Option<String>,
    filter: Option<FilterFn>,
    formatter: Option<FormatterFn>,
}

impl ColumnDescriptor {
    /// Map output key `dt` to source field `db`.
    pub fn new(output_key: impl Into<String>, source_field: impl Into<String>) -> Self {
        Self {
            output_key: output_key.into(),
            source_field: Some(source_field.into()),
            relation: None,
            filter: None,
            formatter: None,
        }
    }

    /// A column with no backing field. It is never filtered or sorted and projects
    /// to `null` unless a formatter computes it from the row.
    pub fn computed(output_key: impl Into<String>) -> Self {
        Self {
            output_key: output_key.into(),
            source_field: None,
            relation: None,
            filter: None,
            formatter: None,
        }
    }

    /// Read the source field from the related row named `relation`.
    #[must_use]
    pub fn relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &str) -> Predicate + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    #[must_use]
    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Value, &Row) -> Value + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    pub fn source_field(&self) -> Option<&str> {
        self.source_field.as_deref()
    }

    pub fn related_entity(&self) -> Option<&str> {
        self.relation.as_deref()
    }

    pub fn custom_filter(&self) -> Option<&FilterFn> {
        self.filter.as_ref()
    }

    pub fn custom_formatter(&self) -> Option<&FormatterFn> {
        self.formatter.as_ref()
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("output_key", &self.output_key)
            .field("source_field", &self.source_field)
            .field("relation", &self.relation)
            .field("filter", &self.filter.is_some())
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// Ordered, immutable set of column descriptors with unique output keys.
#[derive(Debug, Clone)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnRegistry {
    /// Build a registry, rejecting repeated output keys.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Result<Self, GridError> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i]
                .iter()
                .any(|earlier| earlier.output_key == column.output_key)
            {
                return Err(GridError::DuplicateColumn {
                    key: column.output_key.clone(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Resolve a descriptor by output key.
    pub fn lookup(&self, output_key: &str) -> Result<&ColumnDescriptor, GridError> {
        self.columns
            .iter()
            .find(|column| column.output_key == output_key)
            .ok_or_else(|| GridError::unknown_column(output_key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Source fields readable straight from the base row, in registry order.
    pub fn base_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for column in &self.columns {
            if column.relation.is_some() {
                continue;
            }
            if let Some(field) = &column.source_field
                && !fields.contains(field)
            {
                fields.push(field.clone());
            }
        }
        fields
    }
}
