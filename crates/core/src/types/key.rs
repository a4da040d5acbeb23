//! Canonical join keys.
//!
//! Sources disagree on how identifiers are typed: the scraped client table
//! yields `"5"`, the REST API yields `5`. Every join-key column goes through
//! [`JoinKey::from_value`] before any join so the representation never
//! decides whether two rows match.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};

/// A canonical, string-backed record identifier.
///
/// - Integers become their decimal representation (`5` → `"5"`).
/// - Strings are kept verbatim apart from surrounding whitespace, so leading
///   zeros survive (`"007"` stays `"007"`).
/// - Floats, booleans, null, arrays, objects and blank strings are rejected
///   with [`CoreError::Conversion`].
///
/// ```
/// use serde_json::json;
/// use shop_ledger_core::JoinKey;
///
/// let from_int = JoinKey::from_value(&json!(5), || "profile.id".into()).unwrap();
/// let from_str = JoinKey::from_value(&json!(" 5 "), || "client.ID".into()).unwrap();
/// assert_eq!(from_int, from_str);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinKey(String);

impl JoinKey {
    /// Canonicalize a JSON value into a join key.
    ///
    /// `context` is only evaluated on failure and names the offending field
    /// in the returned error.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conversion`] if the value is not an integer or a
    /// non-blank string.
    pub fn from_value(value: &Value, context: impl FnOnce() -> String) -> Result<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self(u.to_string()))
                } else {
                    Err(CoreError::conversion(
                        context(),
                        value,
                        "floating-point numbers are not identifiers",
                    ))
                }
            }
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Err(CoreError::conversion(context(), value, "identifier is blank"))
                } else {
                    Ok(Self(trimmed.to_owned()))
                }
            }
            Value::Null => Err(CoreError::conversion(context(), value, "identifier is null")),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(CoreError::conversion(
                context(),
                value,
                "value is not identifier-shaped",
            )),
        }
    }

    /// Canonicalize a textual identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conversion`] if the string is blank.
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_value(&Value::String(s.to_owned()), || "identifier".to_owned())
    }

    /// Returns the canonical identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JoinKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<i64> for JoinKey {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u32> for JoinKey {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}
