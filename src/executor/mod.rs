//! Grid query execution.
//!
//! Two interchangeable backends share the [`Executor`] contract:
//!
//! - [`RawSqlExecutor`] wraps a caller-supplied SQL statement as a subquery and issues three
//!   bound statements (page, filtered count, total count).
//! - [`BuilderExecutor`] drives a composable [`GridQuery`], by default a Sea-ORM
//!   [`EntityQuery`], counting before and after filtering.
//!
//! Both report `total` without filtering and `filtered` with filtering but without
//! pagination.

use async_trait::async_trait;

use crate::columns::Row;
use crate::errors::GridError;
use crate::filtering::{OrderDirective, PredicateSet};
use crate::request::Pagination;

pub mod builder;
pub mod entity;
pub mod raw;

pub use builder::{BuilderExecutor, GridQuery};
pub use entity::{EntityQuery, RelationLink};
pub use raw::{Bindings, RawSqlExecutor};

/// Everything an executor needs to run one grid request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub predicates: PredicateSet,
    pub order: Vec<OrderDirective>,
    pub pagination: Pagination,
    /// Base-row source fields kept from fetched rows (raw SQL backend)
    pub fields: Vec<String>,
}

/// Counts and the materialized page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fetched {
    pub total: u64,
    pub filtered: u64,
    pub rows: Vec<Row>,
}

#[async_trait]
pub trait Executor: Send + Sized {
    async fn execute(self, plan: &QueryPlan) -> Result<Fetched, GridError>;
}
