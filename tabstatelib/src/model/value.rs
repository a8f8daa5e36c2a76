//! Cell values and record access.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// The value held by a body cell.
///
/// Accessors map a record to one of these. Serialises untagged, so a cell
/// round-trips as the plain JSON scalar it came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing or null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
}

impl CellValue {
    /// Create a text cell value
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Get the text, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the number, if this is a numeric value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Compare two values for sorting.
    ///
    /// Two texts compare lexicographically and two numbers numerically. Any
    /// other pairing (including mixed kinds, nulls and NaN) compares equal, so
    /// it never disturbs the relative order of a stable sort.
    pub fn compare(a: &CellValue, b: &CellValue) -> Ordering {
        match (a, b) {
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Number(a), CellValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            _ => Ordering::Equal,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

impl From<&serde_json::Value> for CellValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Null, CellValue::Number),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// A data record that string accessors can read fields from.
///
/// Columns with a function accessor never call this; columns declared with a
/// field-path accessor (e.g. `"firstName"` or `"address.city"`) resolve
/// through [`Record::field`]. Unknown fields resolve to [`CellValue::Null`].
pub trait Record {
    /// Look up the value at `path`.
    fn field(&self, path: &str) -> CellValue;
}

impl Record for serde_json::Value {
    fn field(&self, path: &str) -> CellValue {
        let mut current = self;
        for segment in path.split('.') {
            let next = match current {
                serde_json::Value::Object(map) => map.get(segment),
                serde_json::Value::Array(items) => {
                    segment.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return CellValue::Null,
            }
        }
        CellValue::from(current)
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn field(&self, path: &str) -> CellValue {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        match (self.get(head), rest) {
            (Some(value), Some(rest)) => value.field(rest),
            (Some(value), None) => CellValue::from(value),
            (None, _) => CellValue::Null,
        }
    }
}

impl Record for HashMap<String, CellValue> {
    fn field(&self, path: &str) -> CellValue {
        self.get(path).cloned().unwrap_or_default()
    }
}

impl Record for BTreeMap<String, CellValue> {
    fn field(&self, path: &str) -> CellValue {
        self.get(path).cloned().unwrap_or_default()
    }
}
