//! Output cells.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One cell of an output [`Table`](crate::Table).
///
/// [`Cell::Empty`] is the empty marker: "no value", distinct from a zero.
/// JSON `null` from a source is normalized to `Empty` by [`Cell::from`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Value(Value),
}

impl Cell {
    /// Whether this is the empty marker.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the wrapped value, if any.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Empty => None,
            Self::Value(v) => Some(v),
        }
    }

    /// Returns the cell as an integer, if it holds one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    /// Returns the cell's structured value.
    ///
    /// Tables read back from disk hold nested objects as JSON text; this
    /// parses such text and otherwise returns the value unchanged.
    #[must_use]
    pub fn as_structured(&self) -> Option<Value> {
        match self.as_value()? {
            Value::String(s) => {
                let trimmed = s.trim_start();
                if trimmed.starts_with('{') || trimmed.starts_with('[') {
                    serde_json::from_str(s).ok()
                } else {
                    Some(Value::String(s.clone()))
                }
            }
            other => Some(other.clone()),
        }
    }

    /// Render the cell as a flat text field.
    ///
    /// Empty → `""`, strings verbatim, everything else as compact JSON.
    #[must_use]
    pub fn to_field(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Value(Value::String(s)) => s.clone(),
            Self::Value(v) => v.to_string(),
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            other => Self::Value(other),
        }
    }
}

impl From<Option<&Value>> for Cell {
    fn from(value: Option<&Value>) -> Self {
        value.cloned().map_or(Self::Empty, Self::from)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<u64> for Cell {
    fn from(n: u64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Value(Value::String(s.to_owned()))
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Value(Value::String(s))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_field())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_is_empty() {
        assert_eq!(Cell::from(json!(null)), Cell::Empty);
        assert_eq!(Cell::from(None), Cell::Empty);
    }

    #[test]
    fn test_zero_is_not_empty() {
        let zero = Cell::from(0_i64);
        assert!(!zero.is_empty());
        assert_eq!(zero.as_i64(), Some(0));
    }

    #[test]
    fn test_to_field() {
        assert_eq!(Cell::Empty.to_field(), "");
        assert_eq!(Cell::from("Active").to_field(), "Active");
        assert_eq!(Cell::from(json!(109.95)).to_field(), "109.95");
        assert_eq!(
            Cell::from(json!({"rate": 3.9, "count": 120})).to_field(),
            r#"{"rate":3.9,"count":120}"#
        );
    }

    #[test]
    fn test_as_structured_parses_json_text() {
        let cell = Cell::from(r#"{"city": "kilcoole"}"#);
        assert_eq!(cell.as_structured(), Some(json!({"city": "kilcoole"})));
        assert_eq!(Cell::from("plain").as_structured(), Some(json!("plain")));
        assert_eq!(Cell::Empty.as_structured(), None);
    }
}
