use sea_orm::TransactionTrait;

use crate::columns::ColumnRegistry;
use crate::config::GridConfig;
use crate::errors::GridError;
use crate::executor::{BuilderExecutor, Executor, GridQuery, QueryPlan, RawSqlExecutor};
use crate::filtering::{build_order, build_predicates};
use crate::projection::project;
use crate::request::{DataTableRequest, RequestModel};
use crate::response::ResultEnvelope;

/// One grid request bound to its column registry.
///
/// ```rust,ignore
/// let table = DataTable::new(&request, columns);
///
/// // Raw SQL over an opaque base statement
/// let envelope = table.query_result(&db, "SELECT * FROM people").await?;
///
/// // Or composed onto a Sea-ORM select
/// let envelope = table
///     .builder_result(EntityQuery::new(person::Entity::find(), &db))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct DataTable {
    request: RequestModel,
    columns: ColumnRegistry,
    config: GridConfig,
}

impl DataTable {
    pub fn new(request: &DataTableRequest, columns: ColumnRegistry) -> Self {
        Self::with_config(request, columns, GridConfig::default())
    }

    pub fn with_config(request: &DataTableRequest, columns: ColumnRegistry, config: GridConfig) -> Self {
        Self {
            request: RequestModel::from_request(request, &config),
            columns,
            config,
        }
    }

    pub fn request(&self) -> &RequestModel {
        &self.request
    }

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    /// Translate the request into backend-agnostic filters, ordering and paging.
    pub fn plan(&self) -> QueryPlan {
        QueryPlan {
            predicates: build_predicates(&self.request, &self.columns),
            order: build_order(&self.request, &self.columns),
            pagination: self.request.pagination,
            fields: self.columns.base_fields(),
        }
    }

    /// Run against `base_query` wrapped as a subquery. The page and both counts are read
    /// inside one transaction.
    pub async fn query_result<C>(&self, db: &C, base_query: &str) -> Result<ResultEnvelope, GridError>
    where
        C: TransactionTrait,
    {
        let txn = db.begin().await?;
        let executor =
            RawSqlExecutor::new(&txn, base_query).with_alias(self.config.subquery_alias.as_str());
        let envelope = self.run(executor).await?;
        txn.commit().await?;
        Ok(envelope)
    }

    /// Run by composing filters, ordering and paging onto `query`.
    pub async fn builder_result<Q: GridQuery>(&self, query: Q) -> Result<ResultEnvelope, GridError> {
        self.run(BuilderExecutor::new(query)).await
    }

    #[tracing::instrument(skip_all, fields(draw = self.request.request_token))]
    pub async fn run<X: Executor>(&self, executor: X) -> Result<ResultEnvelope, GridError> {
        let plan = self.plan();
        let fetched = executor.execute(&plan).await?;

        if fetched.filtered > fetched.total {
            tracing::error!(
                total = fetched.total,
                filtered = fetched.filtered,
                "Filtered count exceeds total count"
            );
        }

        let data = project(&fetched.rows, self.request.page_start, &self.columns)?;

        Ok(ResultEnvelope {
            draw: self.request.request_token,
            records_total: fetched.total,
            records_filtered: fetched.filtered,
            data,
        })
    }
}
