//! Typed view over cart records.

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::types::key::JoinKey;
use crate::types::record::Record;

/// One product-quantity pair within a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: JoinKey,
    pub quantity: u64,
}

/// A cart reduced to the fields the aggregator reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub user_id: JoinKey,
    pub line_items: Vec<LineItem>,
}

impl Cart {
    /// Parse the cart at position `index` of its record set.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingField`] if `userId`, `products`, or a line-item's
    ///   `productId`/`quantity` is absent.
    /// - [`CoreError::Conversion`] if `products` is not an array, a line-item
    ///   is not an object, or a key/quantity cannot be converted.
    pub fn from_record(record: &Record, index: usize) -> Result<Self> {
        let context = || format!("cart[{index}]");
        let user_id = record.key("userId", context)?;

        let products = record.require("products", context)?;
        let Value::Array(items) = products else {
            return Err(CoreError::conversion(
                format!("cart[{index}].products"),
                products,
                "products must be an array",
            ));
        };

        let line_items = items
            .iter()
            .enumerate()
            .map(|(i, item)| LineItem::from_value(item, || format!("cart[{index}].products[{i}]")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            user_id,
            line_items,
        })
    }
}

impl LineItem {
    fn from_value(value: &Value, context: impl Fn() -> String) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(CoreError::conversion(
                context(),
                value,
                "line-item is not an object",
            ));
        };

        let product_id = match fields.get("productId") {
            Some(Value::Null) | None => return Err(CoreError::missing(context(), "productId")),
            Some(v) => JoinKey::from_value(v, || format!("{}.productId", context()))?,
        };
        let quantity = match fields.get("quantity") {
            Some(Value::Null) | None => return Err(CoreError::missing(context(), "quantity")),
            Some(v) => parse_quantity(v, || format!("{}.quantity", context()))?,
        };

        Ok(Self {
            product_id,
            quantity,
        })
    }
}

/// Quantities are non-negative integers, either as JSON numbers or numeric
/// strings.
fn parse_quantity(value: &Value, context: impl FnOnce() -> String) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        CoreError::conversion(context(), value, "quantity must be a non-negative integer")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value, String::new).unwrap()
    }

    #[test]
    fn test_parse_cart() {
        let cart = Cart::from_record(
            &record(json!({
                "id": 1,
                "userId": 7,
                "date": "2020-03-02T00:00:00.000Z",
                "products": [{"productId": 10, "quantity": 2}, {"productId": "11", "quantity": "3"}]
            })),
            0,
        )
        .unwrap();

        assert_eq!(cart.user_id, JoinKey::from(7_i64));
        assert_eq!(
            cart.line_items,
            vec![
                LineItem {
                    product_id: JoinKey::from(10_i64),
                    quantity: 2
                },
                LineItem {
                    product_id: JoinKey::from(11_i64),
                    quantity: 3
                },
            ]
        );
    }

    #[test]
    fn test_empty_products_is_valid() {
        let cart = Cart::from_record(&record(json!({"userId": 1, "products": []})), 0).unwrap();
        assert!(cart.line_items.is_empty());
    }

    #[test]
    fn test_missing_products() {
        let err = Cart::from_record(&record(json!({"id": 4, "userId": 1})), 4).unwrap_err();
        assert_eq!(
            err,
            CoreError::MissingField {
                context: "cart[4]".to_owned(),
                field: "products".to_owned()
            }
        );
    }

    #[test]
    fn test_missing_user_id() {
        let err = Cart::from_record(&record(json!({"products": []})), 0).unwrap_err();
        assert!(matches!(err, CoreError::MissingField { field, .. } if field == "userId"));
    }

    #[test]
    fn test_missing_line_item_fields() {
        let err = Cart::from_record(
            &record(json!({"userId": 1, "products": [{"productId": 1, "quantity": 1}, {"quantity": 2}]})),
            2,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CoreError::MissingField {
                context: "cart[2].products[1]".to_owned(),
                field: "productId".to_owned()
            }
        );

        let err =
            Cart::from_record(&record(json!({"userId": 1, "products": [{"productId": 1}]})), 0)
                .unwrap_err();
        assert!(matches!(err, CoreError::MissingField { field, .. } if field == "quantity"));
    }

    #[test]
    fn test_bad_quantity() {
        for quantity in [json!(-1), json!(1.5), json!("two"), json!([2])] {
            let err = Cart::from_record(
                &record(json!({"userId": 1, "products": [{"productId": 1, "quantity": quantity}]})),
                0,
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::Conversion { .. }), "{err}");
        }
    }

    #[test]
    fn test_products_not_array() {
        let err =
            Cart::from_record(&record(json!({"userId": 1, "products": {"productId": 1}})), 0)
                .unwrap_err();
        assert!(matches!(err, CoreError::Conversion { .. }));
    }
}
