//! # gridcrate
//!
//! Server-side processing for DataTables-style grids. A client posts a page window, sort
//! order and free-text/per-column search terms; the crate translates them into bound SQL
//! (or Sea-ORM query-builder calls), runs the page and count queries, and maps the rows to
//! the client's output shape.
//!
//! ```rust,ignore
//! use gridcrate::{ColumnDescriptor, ColumnRegistry, DataTable, DataTableRequest, GridError, ResultEnvelope};
//!
//! async fn people(
//!     State(db): State<DatabaseConnection>,
//!     Json(request): Json<DataTableRequest>,
//! ) -> Result<ResultEnvelope, GridError> {
//!     let columns = ColumnRegistry::new(vec![
//!         ColumnDescriptor::new("name", "name"),
//!         ColumnDescriptor::new("age", "age"),
//!     ])?;
//!     DataTable::new(&request, columns)
//!         .query_result(&db, "SELECT name, age FROM people")
//!         .await
//! }
//! ```

pub mod columns;
pub mod config;
pub mod datatable;
pub mod errors;
pub mod executor;
pub mod filtering;
pub mod projection;
pub mod request;
pub mod response;

pub use columns::{ColumnDescriptor, ColumnRegistry, Row};
pub use config::GridConfig;
pub use datatable::DataTable;
pub use errors::GridError;
pub use executor::{
    BuilderExecutor, EntityQuery, Executor, Fetched, GridQuery, QueryPlan, RawSqlExecutor,
    RelationLink,
};
pub use filtering::{Operator, OrderDirective, Predicate, PredicateSet};
pub use projection::{INDEX_COLUMN, OutputRow};
pub use request::{DataTableRequest, Direction, Pagination, RequestModel};
pub use response::ResultEnvelope;
