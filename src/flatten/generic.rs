//! Schema-less rule-set: normalizes the whole response into `dotted.key.path` columns.
//!
//! Objects contribute their keys, lists contribute their indices, so
//! `{"documents": [{"data": {"bl_number": "X"}}]}` becomes a
//! `documents.0.data.bl_number` column. Useful when no domain schema is known.

use serde_json::Value;

use super::FILENAME_COLUMN;
use crate::contract::{Flattener, Header};
use crate::response::{CellValue, FlatRow, RawResponse};

pub struct GenericFlattener;

impl Flattener for GenericFlattener {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn header(&self) -> Header {
        Header::Discovered
    }

    fn flatten(&self, response: &RawResponse) -> Vec<FlatRow> {
        let mut row = FlatRow::new();
        row.insert(
            FILENAME_COLUMN.to_string(),
            CellValue::Text(response.filename.clone()),
        );
        for (key, value) in &response.payload {
            normalize_into(&mut row, key.clone(), value);
        }
        vec![row]
    }
}

fn normalize_into(row: &mut FlatRow, path: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                normalize_into(row, format!("{path}.{key}"), child);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                normalize_into(row, format!("{path}.{index}"), child);
            }
        }
        scalar => {
            row.insert(path, CellValue::from_json(scalar));
        }
    }
}
