use crate::columns::ColumnRegistry;
use crate::errors::GridError;
use crate::request::{Direction, RequestModel, SortDirective};

/// A resolved sort key on a base-row source field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDirective {
    pub field: String,
    pub direction: Direction,
}

/// Resolve the request's sort directives, in request order.
///
/// Directives on unknown or non-orderable columns are dropped. Relation-scoped and
/// computed columns cannot be sorted on by either backend and are dropped too.
/// Repeated fields are passed through as-is.
pub fn build_order(request: &RequestModel, registry: &ColumnRegistry) -> Vec<OrderDirective> {
    request
        .sort_directives
        .iter()
        .filter_map(|directive| match resolve(request, registry, directive) {
            Ok(order) => order,
            Err(err) => {
                tracing::debug!(error = %err, "Skipping sort directive");
                None
            }
        })
        .collect()
}

fn resolve(
    request: &RequestModel,
    registry: &ColumnRegistry,
    directive: &SortDirective,
) -> Result<Option<OrderDirective>, GridError> {
    let meta = request
        .columns
        .get(directive.column_index)
        .ok_or_else(|| GridError::unknown_column(directive.column_index.to_string()))?;

    if !meta.orderable {
        return Ok(None);
    }

    let column = registry.lookup(&meta.output_key)?;

    if column.related_entity().is_some() {
        tracing::debug!(column = %meta.output_key, "Sorting on related columns is not supported");
        return Ok(None);
    }

    Ok(column.source_field().map(|field| OrderDirective {
        field: field.to_string(),
        direction: directive.direction,
    }))
}
