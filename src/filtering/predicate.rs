use sea_orm::Value;

use crate::columns::{ColumnDescriptor, ColumnRegistry};
use crate::request::{ColumnMeta, RequestModel};

/// Comparison operators available to predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Case-insensitive LIKE pattern matching
    Like,
    /// Equality (=)
    Eq,
    /// Not equal (!=)
    Neq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// A single filter condition, either on the base row or on a named related entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Direct {
        column: String,
        operator: Operator,
        value: Value,
    },
    RelationScoped {
        relation: String,
        inner: Box<Predicate>,
    },
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::Direct {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Substring match: `column LIKE '%term%'`
    pub fn contains(column: impl Into<String>, term: &str) -> Self {
        Self::new(column, Operator::Like, format!("%{term}%"))
    }

    /// Scope `inner` to rows of the related entity `relation`.
    pub fn within(relation: impl Into<String>, inner: Predicate) -> Self {
        Self::RelationScoped {
            relation: relation.into(),
            inner: Box::new(inner),
        }
    }

    pub fn is_relation_scoped(&self) -> bool {
        matches!(self, Self::RelationScoped { .. })
    }
}

/// Filter predicates grouped by how they combine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    /// OR-combined
    pub global: Vec<Predicate>,
    /// AND-combined, and AND-ed with the global group
    pub columns: Vec<Predicate>,
}

impl PredicateSet {
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.columns.is_empty()
    }
}

/// Build the global and per-column predicate groups for a request.
pub fn build_predicates(request: &RequestModel, registry: &ColumnRegistry) -> PredicateSet {
    let mut set = PredicateSet::default();

    if !request.global_search.is_empty() {
        for meta in request.columns.iter().filter(|meta| meta.searchable) {
            if let Some(predicate) =
                resolve(registry, meta).and_then(|column| predicate_for(column, &request.global_search))
            {
                set.global.push(predicate);
            }
        }
    }

    for meta in &request.columns {
        if !meta.searchable || meta.search_term.is_empty() {
            continue;
        }
        if let Some(predicate) =
            resolve(registry, meta).and_then(|column| predicate_for(column, &meta.search_term))
        {
            set.columns.push(predicate);
        }
    }

    set
}

fn resolve<'r>(registry: &'r ColumnRegistry, meta: &ColumnMeta) -> Option<&'r ColumnDescriptor> {
    match registry.lookup(&meta.output_key) {
        Ok(column) => Some(column),
        Err(err) => {
            tracing::debug!(error = %err, "Skipping search on unregistered column");
            None
        }
    }
}

fn predicate_for(column: &ColumnDescriptor, term: &str) -> Option<Predicate> {
    // Computed columns have nothing to filter on
    let field = column.source_field()?;

    let predicate = match column.custom_filter() {
        Some(filter) => filter(field, term),
        None => Predicate::contains(field, term),
    };

    Some(match column.related_entity() {
        Some(relation) => Predicate::within(relation, predicate),
        None => predicate,
    })
}
