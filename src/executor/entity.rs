//! Sea-ORM implementation of [`GridQuery`].
//!
//! `EntityQuery` wraps a `Select<E>` built by the caller (scopes, joins and base filters
//! already applied) together with the relations grid columns may reference:
//!
//! ```rust,ignore
//! let query = EntityQuery::new(person::Entity::find(), &db)
//!     .relation(RelationLink::new("department", "departments", "department_id", "id"));
//! ```
//!
//! A relation-scoped predicate becomes
//! `EXISTS (SELECT 1 FROM departments WHERE departments.id = people.department_id AND ...)`,
//! and `get()` attaches the first matching related row under the relation name.

use async_trait::async_trait;
use sea_orm::{
    Condition, ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Value,
    sea_query::{Alias, Asterisk, Expr, Func, Query, SimpleExpr},
};
use serde_json::Value as JsonValue;
use std::str::FromStr;

use super::builder::GridQuery;
use crate::columns::Row;
use crate::errors::GridError;
use crate::filtering::{Operator, OrderDirective, Predicate, PredicateSet};

/// A named link from the base entity to a related table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationLink {
    /// Relation name used by column descriptors
    pub name: String,
    /// Related table
    pub table: String,
    /// Column on the base entity
    pub local_key: String,
    /// Column on the related table matched against `local_key`
    pub foreign_key: String,
}

impl RelationLink {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            local_key: local_key.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

pub struct EntityQuery<'c, E, C>
where
    E: EntityTrait,
{
    select: Select<E>,
    conn: &'c C,
    relations: Vec<RelationLink>,
}

impl<'c, E, C> EntityQuery<'c, E, C>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    pub fn new(select: Select<E>, conn: &'c C) -> Self {
        Self {
            select,
            conn,
            relations: Vec::new(),
        }
    }

    /// Declare a relation. A relation named like a base column is not attached to rows,
    /// so it never shadows the column's value.
    #[must_use]
    pub fn relation(mut self, link: RelationLink) -> Self {
        if E::Column::from_str(&link.name).is_ok() {
            tracing::warn!(
                relation = %link.name,
                "Relation name clashes with a base column; related rows will not be attached"
            );
        }
        self.relations.push(link);
        self
    }

    fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    fn link(&self, name: &str) -> Option<&RelationLink> {
        self.relations.iter().find(|link| link.name == name)
    }

    fn base_column(column: &str) -> Option<E::Column> {
        match E::Column::from_str(column) {
            Ok(column) => Some(column),
            Err(_) => {
                tracing::debug!(column = %column, "Skipping filter on unknown entity column");
                None
            }
        }
    }

    fn condition_for(&self, predicate: &Predicate) -> Option<SimpleExpr> {
        match predicate {
            Predicate::Direct {
                column,
                operator,
                value,
            } => {
                let column = Self::base_column(column)?;
                Some(compare(
                    Expr::col((E::default(), column)).into(),
                    *operator,
                    value,
                    self.backend(),
                ))
            }
            Predicate::RelationScoped { relation, inner } => {
                let Some(link) = self.link(relation) else {
                    tracing::warn!(relation = %relation, "Skipping filter on undeclared relation");
                    return None;
                };
                let Predicate::Direct {
                    column,
                    operator,
                    value,
                } = inner.as_ref()
                else {
                    tracing::warn!(relation = %relation, "Nested relation filters are not supported");
                    return None;
                };

                let table = Alias::new(&link.table);
                let mut exists = Query::select();
                exists
                    .expr(Expr::val(1))
                    .from(table.clone())
                    .and_where(
                        Expr::col((table.clone(), Alias::new(&link.foreign_key)))
                            .equals((E::default(), Alias::new(&link.local_key))),
                    )
                    .and_where(compare(
                        Expr::col((table, Alias::new(column))).into(),
                        *operator,
                        value,
                        self.backend(),
                    ));
                Some(Expr::exists(exists))
            }
        }
    }

    /// Attach the first related row of every declared relation to each base row.
    async fn load_relations(&self, rows: &mut [Row]) -> Result<(), GridError> {
        for link in &self.relations {
            let keys: Vec<Value> = rows
                .iter()
                .filter_map(|row| row.get(&link.local_key).and_then(json_to_value))
                .collect();

            let related = if keys.is_empty() {
                Vec::new()
            } else {
                let mut select = Query::select();
                select
                    .column(Asterisk)
                    .from(Alias::new(&link.table))
                    .and_where(Expr::col(Alias::new(&link.foreign_key)).is_in(keys));
                let statement = self.backend().build(&select);
                JsonValue::find_by_statement(statement)
                    .all(self.conn)
                    .await?
            };

            for row in rows.iter_mut() {
                if row.contains_key(&link.name) {
                    continue;
                }
                let matched = row.get(&link.local_key).and_then(|key| {
                    related
                        .iter()
                        .find(|candidate| candidate.get(&link.foreign_key) == Some(key))
                        .cloned()
                });
                row.insert(link.name.clone(), matched.unwrap_or(JsonValue::Null));
            }
        }
        Ok(())
    }
}

/// Build `target <op> value`. LIKE is case-insensitive on every backend.
fn compare(target: SimpleExpr, operator: Operator, value: &Value, backend: DatabaseBackend) -> SimpleExpr {
    let value = value.clone();
    match (operator, value) {
        (Operator::Like, Value::String(Some(pattern))) => {
            let target = match backend {
                DatabaseBackend::Postgres => Expr::cast_as(Expr::expr(target), Alias::new("TEXT")),
                _ => target,
            };
            Expr::expr(Func::upper(target)).like(pattern.to_uppercase())
        }
        // Patterns only make sense for strings
        (Operator::Like | Operator::Eq, value) => Expr::expr(target).eq(value),
        (Operator::Neq, value) => Expr::expr(target).ne(value),
        (Operator::Gt, value) => Expr::expr(target).gt(value),
        (Operator::Gte, value) => Expr::expr(target).gte(value),
        (Operator::Lt, value) => Expr::expr(target).lt(value),
        (Operator::Lte, value) => Expr::expr(target).lte(value),
    }
}

fn json_to_value(json: &JsonValue) -> Option<Value> {
    match json {
        JsonValue::Number(number) => number
            .as_i64()
            .map(Value::from)
            .or_else(|| number.as_f64().map(Value::from)),
        JsonValue::String(text) => Some(Value::from(text.clone())),
        _ => None,
    }
}

#[async_trait]
impl<'c, E, C> GridQuery for EntityQuery<'c, E, C>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    async fn count(&self) -> Result<u64, GridError> {
        Ok(self.select.clone().count(self.conn).await?)
    }

    fn filter(mut self, predicates: &PredicateSet) -> Self {
        let mut condition = Condition::all();

        let global: Vec<SimpleExpr> = predicates
            .global
            .iter()
            .filter_map(|predicate| self.condition_for(predicate))
            .collect();
        if !global.is_empty() {
            condition = condition.add(
                global
                    .into_iter()
                    .fold(Condition::any(), |any, expr| any.add(expr)),
            );
        }

        for predicate in &predicates.columns {
            if let Some(expr) = self.condition_for(predicate) {
                condition = condition.add(expr);
            }
        }

        self.select = self.select.filter(condition);
        self
    }

    fn order_by(mut self, directive: &OrderDirective) -> Self {
        if let Some(column) = Self::base_column(&directive.field) {
            self.select = self.select.order_by(column, directive.direction.into());
        }
        self
    }

    fn paginate(mut self, offset: u64, limit: u64) -> Self {
        self.select = self.select.offset(offset).limit(limit);
        self
    }

    async fn get(self) -> Result<Vec<Row>, GridError> {
        let mut rows: Vec<Row> = self
            .select
            .clone()
            .into_json()
            .all(self.conn)
            .await?
            .into_iter()
            .filter_map(|json| match json {
                JsonValue::Object(row) => Some(row),
                _ => None,
            })
            .collect();

        self.load_relations(&mut rows).await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::SqliteQueryBuilder;

    fn render(expr: SimpleExpr) -> String {
        Query::select()
            .expr(Expr::val(1))
            .and_where(expr)
            .to_string(SqliteQueryBuilder)
    }

    #[test]
    fn test_like_is_upper_cased() {
        let sql = render(compare(
            Expr::col(Alias::new("name")).into(),
            Operator::Like,
            &Value::from("%an%"),
            DatabaseBackend::Sqlite,
        ));
        assert_eq!(sql, r#"SELECT 1 WHERE UPPER("name") LIKE '%AN%'"#);
    }

    #[test]
    fn test_comparison_operators() {
        let sql = render(compare(
            Expr::col(Alias::new("age")).into(),
            Operator::Gte,
            &Value::from(30_i64),
            DatabaseBackend::Sqlite,
        ));
        assert_eq!(sql, r#"SELECT 1 WHERE "age" >= 30"#);
    }

    #[test]
    fn test_json_keys_convert_to_values() {
        assert_eq!(json_to_value(&serde_json::json!(3)), Some(Value::from(3_i64)));
        assert_eq!(
            json_to_value(&serde_json::json!("a")),
            Some(Value::from("a".to_string()))
        );
        assert_eq!(json_to_value(&JsonValue::Null), None);
    }
}
