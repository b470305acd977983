//! # Error Handling for Grid Requests
//!
//! Grid processing distinguishes two classes of failure:
//!
//! - **Recoverable** conditions (`UnknownColumn`, `InvalidPagination`) are produced by
//!   lookups and immediately handled by the caller: the offending directive is skipped or
//!   pagination is dropped. They never reach the client.
//! - **Fatal** conditions (`QueryExecutionFailed`, `MissingField`, `DuplicateColumn`) abort
//!   the request. The client receives a single `{"error": "<message>"}` object and no row data.
//!
//! ## Usage
//!
//! ```rust,ignore
//! async fn people(
//!     State(db): State<DatabaseConnection>,
//!     Json(request): Json<DataTableRequest>,
//! ) -> Result<ResultEnvelope, GridError> {
//!     let table = DataTable::new(&request, people_columns()?);
//!     table.query_result(&db, "SELECT * FROM people").await
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

/// Errors raised while translating or executing a grid request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The request referenced an output key that is not in the column registry.
    #[error("Unknown column '{key}'")]
    UnknownColumn {
        /// Output key (or column index) as sent by the client
        key: String,
    },

    /// The store rejected one of the grid statements.
    #[error("An SQL error occurred: {message}")]
    QueryExecutionFailed {
        /// Store error text
        message: String,
    },

    /// A projected row did not carry the source field of a plain column.
    #[error("Missing field '{field}' in result row")]
    MissingField {
        /// Source field that was looked up
        field: String,
    },

    /// Negative start or non-positive page length.
    #[error("Invalid pagination window (start {start}, length {length})")]
    InvalidPagination { start: i64, length: i64 },

    /// Two column descriptors share the same output key.
    #[error("Duplicate column '{key}' in registry")]
    DuplicateColumn { key: String },
}

impl GridError {
    pub fn unknown_column(key: impl Into<String>) -> Self {
        Self::UnknownColumn { key: key.into() }
    }

    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryExecutionFailed {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Whether the condition degrades to a default instead of aborting the request.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownColumn { .. } | Self::InvalidPagination { .. }
        )
    }

    fn log_internal(&self) {
        match self {
            Self::QueryExecutionFailed { message } => {
                tracing::error!(error = %message, "Grid query failed");
            }
            Self::MissingField { field } => {
                tracing::error!(field = %field, "Grid column mapping references a missing field");
            }
            Self::DuplicateColumn { key } => {
                tracing::error!(key = %key, "Grid column registry is misconfigured");
            }
            _ => {
                tracing::debug!(error = %self, "Recoverable grid error surfaced to client");
            }
        }
    }
}

/// Convert Sea-ORM errors into a fatal execution failure carrying the store text.
impl From<DbErr> for GridError {
    fn from(err: DbErr) -> Self {
        Self::query_failed(err.to_string())
    }
}

/// Error body understood by the grid client
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// The grid client only surfaces the message for successful HTTP responses, so fatal
/// errors are reported in a 200 body that replaces the whole envelope.
impl IntoResponse for GridError {
    fn into_response(self) -> Response {
        self.log_internal();

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}
