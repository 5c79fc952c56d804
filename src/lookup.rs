//! Safe navigation over loosely-shaped JSON.
//!
//! Extraction responses are inconsistently shaped: keys go missing, objects
//! turn up where lists were expected and numbers arrive as strings. Every helper
//! here returns a default as soon as a step is absent or has the wrong shape, so
//! callers never have to match on the structure themselves.

use serde_json::{Map, Value};

use crate::response::CellValue;

/// One step of a path: an object key or a list index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    Key(&'a str),
    Index(usize),
}

/// Follows `path` from `root`. `None` if any step is missing or the value at
/// that point is not an object (for `Key`) or a list (for `Index`).
pub fn lookup<'v>(root: &'v Value, path: &[Step<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(root, |current, step| match step {
        Step::Key(key) => current.as_object()?.get(*key),
        Step::Index(index) => current.as_array()?.get(*index),
    })
}

/// [`lookup`] starting from an object's map.
pub fn lookup_in<'v>(root: &'v Map<String, Value>, path: &[Step<'_>]) -> Option<&'v Value> {
    let (first, rest) = path.split_first()?;
    let start = match first {
        Step::Key(key) => root.get(*key)?,
        Step::Index(_) => return None,
    };
    lookup(start, rest)
}

/// Single key of an object, `None` when `root` is not an object.
pub fn field<'v>(root: &'v Value, key: &str) -> Option<&'v Value> {
    root.as_object()?.get(key)
}

/// The value at `path` as a cell; missing or `null` is [`CellValue::Empty`].
pub fn cell_at(root: &Value, path: &[Step<'_>]) -> CellValue {
    lookup(root, path).map(CellValue::from_json).unwrap_or_default()
}

/// The value at `path` rendered as text, or `""`.
pub fn text_at(root: &Value, path: &[Step<'_>]) -> String {
    match lookup(root, path) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => CellValue::from_json(other).to_string(),
        None => String::new(),
    }
}

pub fn object_at<'v>(root: &'v Value, path: &[Step<'_>]) -> Option<&'v Map<String, Value>> {
    lookup(root, path)?.as_object()
}

/// The list at `path`, or an empty slice.
pub fn array_at<'v>(root: &'v Value, path: &[Step<'_>]) -> &'v [Value] {
    lookup(root, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Numeric reading of a value: JSON numbers and numeric strings (surrounding
/// whitespace allowed). Booleans, empty strings and non-finite results are not numbers.
pub fn number_of(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// True for values an `or` fallback should skip: absent, `null` or `""`.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// First non-blank value among `keys` of `root`.
pub fn first_present<'v>(root: &'v Value, keys: &[&str]) -> Option<&'v Value> {
    keys.iter()
        .map(|key| field(root, key))
        .find(|value| !is_blank(*value))
        .flatten()
}
