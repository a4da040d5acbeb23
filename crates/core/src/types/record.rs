//! Source records and record sets.
//!
//! A [`Record`] is one ordered key-value object as handed over by a record
//! source. Field order is preserved (`serde_json` is built with
//! `preserve_order`) because it becomes output column order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::types::key::JoinKey;

/// One ordered key-value record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conversion`] if `value` is not a JSON object.
    pub fn from_value(value: Value, context: impl FnOnce() -> String) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CoreError::conversion(
                context(),
                &other,
                "record is not an object",
            )),
        }
    }

    /// Returns the value of `field`, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the value of a required field.
    ///
    /// An explicit `null` counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingField`] if the field is absent or null.
    pub fn require(&self, field: &str, context: impl FnOnce() -> String) -> Result<&Value> {
        match self.0.get(field) {
            Some(Value::Null) | None => Err(CoreError::missing(context(), field)),
            Some(value) => Ok(value),
        }
    }

    /// Canonicalize a required field into a [`JoinKey`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingField`] if the field is absent, or
    /// [`CoreError::Conversion`] if it is not identifier-shaped.
    pub fn key(&self, field: &str, context: impl Fn() -> String) -> Result<JoinKey> {
        let value = self.require(field, &context)?;
        JoinKey::from_value(value, || format!("{}.{field}", context()))
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Iterate over field names in record order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// An ordered sequence of records plus the header list naming their columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    headers: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    /// Create a record set from parts.
    #[must_use]
    pub const fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    /// Build a record set from fixed-width text rows, as scraped from an
    /// HTML table. Every cell becomes a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RowWidth`] if any row's length differs from the
    /// header count.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(row, cells)| {
                if cells.len() != headers.len() {
                    return Err(CoreError::RowWidth {
                        row,
                        expected: headers.len(),
                        found: cells.len(),
                    });
                }
                Ok(headers
                    .iter()
                    .cloned()
                    .zip(cells.into_iter().map(Value::String))
                    .collect())
            })
            .collect::<Result<Vec<Record>>>()?;
        Ok(Self { headers, records })
    }

    /// Build a record set from JSON objects, taking the header list from the
    /// first object's keys. An empty input yields an empty header list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conversion`] if any value is not an object.
    pub fn from_values(kind: &str, values: Vec<Value>) -> Result<Self> {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Record::from_value(value, || format!("{kind}[{i}]")))
            .collect::<Result<Vec<_>>>()?;
        let headers = records
            .first()
            .map(|first| first.keys().map(str::to_owned).collect())
            .unwrap_or_default();
        Ok(Self { headers, records })
    }

    /// Build a record set from JSON objects with an explicit header list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conversion`] if any value is not an object.
    pub fn with_headers(kind: &str, headers: Vec<String>, values: Vec<Value>) -> Result<Self> {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Record::from_value(value, || format!("{kind}[{i}]")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { headers, records })
    }

    /// Column names in order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Records in source order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
