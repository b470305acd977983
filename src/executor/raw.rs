//! Raw SQL backend.
//!
//! The caller's base statement is treated as an opaque subquery:
//!
//! ```sql
//! SELECT * FROM (<base query>) AS `scoped`
//!   WHERE (UPPER(`name`) LIKE ? OR UPPER(`age`) LIKE ?) AND UPPER(`name`) LIKE ?
//!   ORDER BY `age` ASC
//!   LIMIT 10 OFFSET 0
//! ```
//!
//! Fetched rows are decoded by Sea-ORM and narrowed to the registered source fields. A
//! field the base query does not produce is simply absent from the row, so projection
//! reports it as [`GridError::MissingField`].
//!
//! Search operands are never interpolated into SQL text. Every value is bound, and also
//! recorded under a named key (`:binding_0`, `:binding_1`, ...) for diagnostics.
//! Relation-scoped predicates cannot be expressed here; related values must be pre-joined
//! into the base query and registered as plain columns.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, QueryResult, Statement, Value};
use serde_json::Value as JsonValue;

use super::{Executor, Fetched, QueryPlan};
use crate::columns::Row;
use crate::config::DEFAULT_SUBQUERY_ALIAS;
use crate::errors::GridError;
use crate::filtering::{Operator, OrderDirective, Predicate, PredicateSet};
use crate::request::Pagination;

const COUNT_ALIAS: &str = "grid_count";

/// Ordered bound values for one request, keyed `:binding_<n>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings {
    backend: DatabaseBackend,
    entries: Vec<(String, Value)>,
}

impl Bindings {
    pub fn new(backend: DatabaseBackend) -> Self {
        Self {
            backend,
            entries: Vec::new(),
        }
    }

    /// Record `value` and return the placeholder to splice into the SQL text.
    pub fn bind(&mut self, value: Value) -> String {
        let position = self.entries.len();
        self.entries.push((format!(":binding_{position}"), value));
        match self.backend {
            DatabaseBackend::Postgres => format!("${}", position + 1),
            _ => "?".to_string(),
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value)
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, value)| value.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Quote an identifier for `backend`, doubling any embedded quote character.
///
/// SQLite reads an unresolvable double-quoted identifier as a string literal, so it gets
/// backticks like MySQL.
pub fn quote_ident(backend: DatabaseBackend, ident: &str) -> String {
    let quote = match backend {
        DatabaseBackend::Postgres => '"',
        _ => '`',
    };
    let escaped = ident.replace(quote, &format!("{quote}{quote}"));
    format!("{quote}{escaped}{quote}")
}

fn upper_pattern(value: &Value) -> Value {
    match value {
        Value::String(Some(pattern)) => Value::from(pattern.to_uppercase()),
        other => other.clone(),
    }
}

fn render_predicate(predicate: &Predicate, bindings: &mut Bindings) -> Option<String> {
    match predicate {
        Predicate::Direct {
            column,
            operator,
            value,
        } => {
            let backend = bindings.backend;
            let column = quote_ident(backend, column);
            Some(match operator {
                Operator::Like => {
                    let target = match backend {
                        DatabaseBackend::Postgres => format!("UPPER(CAST({column} AS TEXT))"),
                        _ => format!("UPPER({column})"),
                    };
                    let placeholder = bindings.bind(upper_pattern(value));
                    format!("{target} LIKE {placeholder}")
                }
                operator => {
                    let placeholder = bindings.bind(value.clone());
                    format!("{column} {} {placeholder}", operator.as_sql())
                }
            })
        }
        Predicate::RelationScoped { relation, .. } => {
            tracing::warn!(
                relation = %relation,
                "Ignoring relation filter: pre-join related fields into the base query"
            );
            None
        }
    }
}

/// Render the WHERE clause (empty when nothing filters) with its bindings.
pub fn render_where(predicates: &PredicateSet, backend: DatabaseBackend) -> (String, Bindings) {
    let mut bindings = Bindings::new(backend);

    let global: Vec<String> = predicates
        .global
        .iter()
        .filter_map(|predicate| render_predicate(predicate, &mut bindings))
        .collect();

    let mut clauses = Vec::new();
    if !global.is_empty() {
        clauses.push(format!("({})", global.join(" OR ")));
    }
    clauses.extend(
        predicates
            .columns
            .iter()
            .filter_map(|predicate| render_predicate(predicate, &mut bindings)),
    );

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (sql, bindings)
}

pub fn render_order(order: &[OrderDirective], backend: DatabaseBackend) -> String {
    if order.is_empty() {
        return String::new();
    }
    let keys: Vec<String> = order
        .iter()
        .map(|directive| {
            format!(
                "{} {}",
                quote_ident(backend, &directive.field),
                directive.direction.as_sql()
            )
        })
        .collect();
    format!("ORDER BY {}", keys.join(", "))
}

pub fn render_limit(pagination: Pagination, backend: DatabaseBackend) -> String {
    match (pagination, backend) {
        (Pagination::All, _) => String::new(),
        (Pagination::Window { start, length }, DatabaseBackend::MySql) => {
            format!("LIMIT {start}, {length}")
        }
        (Pagination::Window { start, length }, _) => format!("LIMIT {length} OFFSET {start}"),
    }
}

/// SQL text of the three grid statements. The two filtered statements share `bindings`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridStatements {
    pub fetch: String,
    pub filtered_count: String,
    pub total_count: String,
    pub bindings: Bindings,
}

pub fn build_statements(
    base_query: &str,
    alias: &str,
    plan: &QueryPlan,
    backend: DatabaseBackend,
) -> GridStatements {
    let source = format!("FROM ({base_query}) AS {}", quote_ident(backend, alias));
    let (where_clause, bindings) = render_where(&plan.predicates, backend);

    let fetch = [
        format!("SELECT * {source}"),
        where_clause.clone(),
        render_order(&plan.order, backend),
        render_limit(plan.pagination, backend),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ");

    let count = format!("SELECT COUNT(*) AS {COUNT_ALIAS} {source}");
    let filtered_count = if where_clause.is_empty() {
        count.clone()
    } else {
        format!("{count} {where_clause}")
    };

    GridStatements {
        fetch,
        filtered_count,
        total_count: count,
        bindings,
    }
}

/// Runs a grid request against an opaque base SQL statement.
pub struct RawSqlExecutor<'a, C> {
    conn: &'a C,
    base_query: String,
    alias: String,
}

impl<'a, C> RawSqlExecutor<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'a C, base_query: impl Into<String>) -> Self {
        Self {
            conn,
            base_query: base_query.into(),
            alias: DEFAULT_SUBQUERY_ALIAS.to_string(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }
}

#[async_trait]
impl<C> Executor for RawSqlExecutor<'_, C>
where
    C: ConnectionTrait,
{
    async fn execute(self, plan: &QueryPlan) -> Result<Fetched, GridError> {
        let backend = self.conn.get_database_backend();
        let statements = build_statements(&self.base_query, &self.alias, plan, backend);

        tracing::debug!(
            sql = %statements.fetch,
            bindings = ?statements.bindings.keys(),
            "Fetching grid page"
        );
        let results = self
            .conn
            .query_all(Statement::from_sql_and_values(
                backend,
                statements.fetch.as_str(),
                statements.bindings.values(),
            ))
            .await?;
        let rows = results
            .iter()
            .map(|result| decode_row(result, &plan.fields))
            .collect::<Result<Vec<_>, _>>()?;

        let filtered = count(
            self.conn,
            Statement::from_sql_and_values(
                backend,
                statements.filtered_count.as_str(),
                statements.bindings.values(),
            ),
        )
        .await?;

        let total = count(
            self.conn,
            Statement::from_string(backend, statements.total_count.as_str()),
        )
        .await?;

        Ok(Fetched {
            total,
            filtered,
            rows,
        })
    }
}

async fn count<C: ConnectionTrait>(conn: &C, statement: Statement) -> Result<u64, GridError> {
    let count: i64 = match conn.query_one(statement).await? {
        Some(row) => row.try_get("", COUNT_ALIAS)?,
        None => 0,
    };
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Decode one fetched row, keeping only `fields` (every column when `fields` is empty).
fn decode_row(result: &QueryResult, fields: &[String]) -> Result<Row, GridError> {
    let mut row = match JsonValue::from_query_result(result, "")? {
        JsonValue::Object(row) => row,
        other => {
            tracing::warn!(value = %other, "Fetched row did not decode to an object");
            Row::new()
        }
    };
    if !fields.is_empty() {
        row.retain(|column, _| fields.contains(column));
    }
    Ok(row)
}
