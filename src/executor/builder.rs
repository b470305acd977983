use async_trait::async_trait;

use super::{Executor, Fetched, QueryPlan};
use crate::columns::Row;
use crate::errors::GridError;
use crate::filtering::{OrderDirective, PredicateSet};
use crate::request::Pagination;

/// A composable query the builder backend can count, filter, order, page and materialize.
///
/// Implementations interpret relation-scoped predicates with relation-exists semantics and
/// return rows with related rows nested under the relation name.
#[async_trait]
pub trait GridQuery: Send + Sized {
    async fn count(&self) -> Result<u64, GridError>;

    /// Apply `(global OR ...) AND column AND ...` to the query.
    #[must_use]
    fn filter(self, predicates: &PredicateSet) -> Self;

    #[must_use]
    fn order_by(self, directive: &OrderDirective) -> Self;

    #[must_use]
    fn paginate(self, offset: u64, limit: u64) -> Self;

    async fn get(self) -> Result<Vec<Row>, GridError>;
}

/// Runs a grid request by composing onto a caller-supplied [`GridQuery`].
pub struct BuilderExecutor<Q> {
    query: Q,
}

impl<Q: GridQuery> BuilderExecutor<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }
}

#[async_trait]
impl<Q: GridQuery> Executor for BuilderExecutor<Q> {
    async fn execute(self, plan: &QueryPlan) -> Result<Fetched, GridError> {
        let total = self.query.count().await?;

        let mut query = if plan.predicates.is_empty() {
            self.query
        } else {
            self.query.filter(&plan.predicates)
        };

        let filtered = query.count().await?;

        for directive in &plan.order {
            query = query.order_by(directive);
        }
        if let Pagination::Window { start, length } = plan.pagination {
            query = query.paginate(start, length);
        }

        let rows = query.get().await?;
        Ok(Fetched {
            total,
            filtered,
            rows,
        })
    }
}
