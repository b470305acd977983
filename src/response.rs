use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::projection::OutputRow;

/// Response to a grid request: `{draw, recordsTotal, recordsFiltered, data}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    /// Request token echoed back to the client
    pub draw: i64,
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<OutputRow>,
}

impl IntoResponse for ResultEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
