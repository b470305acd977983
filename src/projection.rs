use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::columns::{ColumnDescriptor, ColumnRegistry, Row};
use crate::errors::GridError;

/// Key of the synthetic 1-based row index
pub const INDEX_COLUMN: &str = "indexColumn";

/// One client row: the synthetic index followed by one cell per registered column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub index: u64,
    cells: Vec<(String, Value)>,
}

impl OutputRow {
    pub fn get(&self, output_key: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(key, _)| key == output_key)
            .map(|(_, value)| value)
    }

    pub fn cells(&self) -> &[(String, Value)] {
        &self.cells
    }
}

impl Serialize for OutputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len() + 1))?;
        map.serialize_entry(INDEX_COLUMN, &self.index)?;
        for (key, value) in &self.cells {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Map raw rows into client rows, in registry column order.
pub fn project(
    rows: &[Row],
    page_start: u64,
    registry: &ColumnRegistry,
) -> Result<Vec<OutputRow>, GridError> {
    rows.iter()
        .zip(page_start + 1..)
        .map(|(row, index)| {
            let cells = registry
                .iter()
                .map(|column| Ok((column.output_key().to_string(), cell(column, row)?)))
                .collect::<Result<Vec<_>, GridError>>()?;
            Ok(OutputRow { index, cells })
        })
        .collect()
}

fn cell(column: &ColumnDescriptor, row: &Row) -> Result<Value, GridError> {
    let field = column.source_field();

    if let Some(relation) = column.related_entity() {
        // A missing related row projects as empty, never as an error
        let empty = Row::new();
        let related = match row.get(relation) {
            Some(Value::Object(related)) => related,
            _ => &empty,
        };
        let raw = field.and_then(|field| related.get(field));

        return Ok(match column.custom_formatter() {
            Some(formatter) => formatter(raw.unwrap_or(&Value::Null), related),
            None => match raw {
                Some(Value::Null) | None => Value::String(String::new()),
                Some(value) => value.clone(),
            },
        });
    }

    let Some(field) = field else {
        return Ok(match column.custom_formatter() {
            Some(formatter) => formatter(&Value::Null, row),
            None => Value::Null,
        });
    };

    let raw = row.get(field);
    match column.custom_formatter() {
        Some(formatter) => Ok(formatter(raw.unwrap_or(&Value::Null), row)),
        None => raw.cloned().ok_or_else(|| GridError::missing_field(field)),
    }
}
