//! Inbound grid request: the wire shape sent by the client and its normalized model.
//!
//! The wire types accept both JSON scalars and their string forms, since grid clients
//! commonly post form-encoded values (`"searchable": "true"`, `"start": "10"`).
//! Normalization happens once in [`RequestModel::from_request`]; the model is read-only
//! afterwards.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::config::GridConfig;
use crate::errors::GridError;

/// `{ value: string }` as used by the global and per-column search members
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchValue {
    #[serde(default)]
    pub value: String,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrderRequest {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub column: i64,
    #[serde(default)]
    pub dir: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColumnRequest {
    #[serde(default)]
    pub data: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub searchable: bool,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub orderable: bool,
    #[serde(default)]
    pub search: SearchValue,
}

/// Raw grid request as posted by the client.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataTableRequest {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub draw: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub start: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default = "unlimited_length")]
    pub length: i64,
    #[serde(default)]
    pub search: SearchValue,
    #[serde(default)]
    pub order: Vec<OrderRequest>,
    #[serde(default)]
    pub columns: Vec<ColumnRequest>,
}

/// Page length meaning "return every row"
pub const UNLIMITED_LENGTH: i64 = -1;

const fn unlimited_length() -> i64 {
    UNLIMITED_LENGTH
}

impl Default for DataTableRequest {
    fn default() -> Self {
        Self {
            draw: 0,
            start: 0,
            length: UNLIMITED_LENGTH,
            search: SearchValue::default(),
            order: Vec::new(),
            columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Only the exact literal `"asc"` sorts ascending; anything else sorts descending.
    pub fn parse(dir: &str) -> Self {
        if dir == "asc" { Self::Asc } else { Self::Desc }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl From<Direction> for sea_orm::Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => Self::Asc,
            Direction::Desc => Self::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// No LIMIT/OFFSET
    All,
    Window { start: u64, length: u64 },
}

impl Pagination {
    /// Validate a client window. `length == -1` is the explicit "no limit" marker.
    pub fn from_window(start: i64, length: i64) -> Result<Self, GridError> {
        if length == UNLIMITED_LENGTH {
            return Ok(Self::All);
        }
        match (u64::try_from(start), u64::try_from(length)) {
            (Ok(start), Ok(length)) if length > 0 => Ok(Self::Window { start, length }),
            _ => Err(GridError::InvalidPagination { start, length }),
        }
    }

    /// Cap the page length. An unlimited page becomes a capped window starting at
    /// `offset`, so row indexes still line up with the rows returned.
    #[must_use]
    pub fn clamp(self, offset: u64, max_length: Option<u64>) -> Self {
        match (self, max_length) {
            (Self::Window { start, length }, Some(max)) => Self::Window {
                start,
                length: length.min(max),
            },
            (Self::All, Some(max)) => Self::Window {
                start: offset,
                length: max,
            },
            (pagination, None) => pagination,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortDirective {
    pub column_index: usize,
    pub direction: Direction,
}

/// Per-column request metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub output_key: String,
    pub searchable: bool,
    pub orderable: bool,
    pub search_term: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestModel {
    pub request_token: i64,
    /// Offset used for the synthetic row index
    pub page_start: u64,
    pub pagination: Pagination,
    pub sort_directives: Vec<SortDirective>,
    pub global_search: String,
    pub columns: Vec<ColumnMeta>,
}

impl RequestModel {
    pub fn from_request(request: &DataTableRequest, config: &GridConfig) -> Self {
        let page_start = u64::try_from(request.start).unwrap_or(0);
        let pagination = Pagination::from_window(request.start, request.length)
            .unwrap_or_else(|err| {
                tracing::debug!(error = %err, "Ignoring pagination");
                Pagination::All
            })
            .clamp(page_start, config.max_page_length);

        let sort_directives = request
            .order
            .iter()
            .filter_map(|order| match usize::try_from(order.column) {
                Ok(column_index) => Some(SortDirective {
                    column_index,
                    direction: Direction::parse(&order.dir),
                }),
                Err(_) => {
                    tracing::debug!(column = order.column, "Dropping sort on negative column index");
                    None
                }
            })
            .collect();

        let columns = request
            .columns
            .iter()
            .map(|column| ColumnMeta {
                output_key: column.data.clone(),
                searchable: column.searchable,
                orderable: column.orderable,
                search_term: bounded_term(&column.search.value, config),
            })
            .collect();

        Self {
            request_token: request.draw,
            page_start,
            pagination,
            sort_directives,
            global_search: bounded_term(&request.search.value, config),
            columns,
        }
    }
}

fn bounded_term(term: &str, config: &GridConfig) -> String {
    if term.len() > config.max_search_length {
        tracing::debug!(length = term.len(), "Ignoring oversized search term");
        return String::new();
    }
    term.to_string()
}
