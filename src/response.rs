//! Data model shared by the batch driver, the flatteners and the sheet writer.
//!
//! A [`RawResponse`] is what one upload attempt produced: the parsed body of the
//! extraction API (or an error record) tagged with the source filename. Flatteners
//! turn it into [`FlatRow`]s, which are collected into a [`Table`] for writing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::lookup::{self, Step};

/// One output record: column name to cell, in insertion order.
pub type FlatRow = IndexMap<String, CellValue>;

/// The result of uploading one file.
///
/// `payload` holds the API body as returned (usually `documents`), or the
/// failure record (`error`, `file`). The API never carries the filename, so the
/// driver injects it; when serialized, `filename` sits next to the payload keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub filename: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl RawResponse {
    /// Wraps a successful API body. A stray `filename` key in the body is
    /// replaced by the driver-supplied name.
    pub fn from_body(filename: impl Into<String>, mut payload: Map<String, Value>) -> Self {
        payload.remove("filename");
        Self {
            filename: filename.into(),
            payload,
        }
    }

    /// Builds the error record for a file whose upload failed.
    pub fn failed(filename: impl Into<String>, path: impl fmt::Display, message: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("error".to_string(), Value::String(message.into()));
        payload.insert("file".to_string(), Value::String(path.to_string()));
        Self {
            filename: filename.into(),
            payload,
        }
    }

    /// The `documents` list, or an empty slice when absent or not a list.
    pub fn documents(&self) -> &[Value] {
        self.payload
            .get("documents")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn error(&self) -> Option<&str> {
        self.payload.get("error").and_then(Value::as_str)
    }

    /// The `Error` column value. Non-string error payloads are rendered as JSON text.
    pub fn error_cell(&self) -> CellValue {
        self.payload
            .get("error")
            .map(CellValue::from_json)
            .unwrap_or_default()
    }

    /// `documents[0].data`, only when it is an object. Later documents are ignored.
    pub fn first_document_data(&self) -> Option<&Value> {
        lookup::lookup_in(&self.payload, &[Step::Key("documents"), Step::Index(0), Step::Key("data")])
            .filter(|data| data.is_object())
    }
}

/// A single spreadsheet cell. `Empty` is the "missing" sentinel and is written
/// as a blank cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Copies a JSON value verbatim: scalars keep their type, `null` is empty,
    /// arrays and objects become compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// The rows of one run plus the column order they are written in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<FlatRow>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<FlatRow>) -> Self {
        Self { columns, rows }
    }

    /// Cell at `row` for `column`; missing columns read as empty.
    pub fn cell(&self, row: usize, column: &str) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
