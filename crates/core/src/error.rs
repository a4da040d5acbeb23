//! Error types for the reconciliation core.

use core::fmt;

use thiserror::Error;

use crate::types::RecordSet;

/// Errors raised while reconciling or aggregating record sets.
///
/// Every variant is fatal for the run: the core never skips a malformed row,
/// since a partial aggregate would silently corrupt the sales and cart counts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A join key or numeric field could not be canonicalized.
    #[error("cannot convert {context}: {reason} (got {value})")]
    Conversion {
        /// Where the value came from, e.g. `cart[2].userId`.
        context: String,
        /// The offending value, rendered as JSON.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// A required field is absent.
    #[error("missing field `{field}` in {context}")]
    MissingField {
        /// The record the field was expected on, e.g. `cart[0].products[1]`.
        context: String,
        /// Name of the missing field.
        field: String,
    },

    /// A scraped row does not match its header width.
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        /// Zero-based row index within its record set.
        row: usize,
        /// Number of headers.
        expected: usize,
        /// Number of cells actually present.
        found: usize,
    },
}

impl CoreError {
    pub(crate) fn conversion(
        context: impl Into<String>,
        value: &serde_json::Value,
        reason: &'static str,
    ) -> Self {
        Self::Conversion {
            context: context.into(),
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn missing(context: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            context: context.into(),
            field: field.into(),
        }
    }
}

/// An input record set that was empty.
///
/// Not an error: reconciliation and aggregation still produce a degenerate
/// but well-defined result. Callers may surface these as warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmptyInput {
    Clients,
    Carts,
    UserProfiles,
    ProductCatalog,
}

impl fmt::Display for EmptyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clients => "clients",
            Self::Carts => "carts",
            Self::UserProfiles => "user profiles",
            Self::ProductCatalog => "product catalog",
        };
        write!(f, "{name} input is empty")
    }
}

/// List the input record sets that are empty, in pipeline order.
#[must_use]
pub fn empty_inputs(
    clients: &RecordSet,
    carts: &RecordSet,
    profiles: &RecordSet,
    catalog: &RecordSet,
) -> Vec<EmptyInput> {
    [
        (clients, EmptyInput::Clients),
        (carts, EmptyInput::Carts),
        (profiles, EmptyInput::UserProfiles),
        (catalog, EmptyInput::ProductCatalog),
    ]
    .into_iter()
    .filter(|(set, _)| set.is_empty())
    .map(|(_, kind)| kind)
    .collect()
}

/// Result type alias for [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversion_display() {
        let err =
            CoreError::conversion("cart[0].userId", &json!(1.5), "floats are not identifiers");
        assert_eq!(
            err.to_string(),
            "cannot convert cart[0].userId: floats are not identifiers (got 1.5)"
        );
    }

    #[test]
    fn test_missing_field_display() {
        let err = CoreError::missing("cart[3]", "products");
        assert_eq!(err.to_string(), "missing field `products` in cart[3]");
    }

    #[test]
    fn test_empty_input_display() {
        assert_eq!(EmptyInput::Carts.to_string(), "carts input is empty");
    }

    #[test]
    fn test_empty_inputs() {
        let full = RecordSet::from_values("x", vec![json!({"id": 1})]).unwrap_or_default();
        let empty = RecordSet::default();

        assert_eq!(
            empty_inputs(&full, &empty, &full, &empty),
            vec![EmptyInput::Carts, EmptyInput::ProductCatalog]
        );
        assert!(empty_inputs(&full, &full, &full, &full).is_empty());
    }
}
