//! Per-product sales aggregation.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::table::Table;
use crate::types::{Cart, Cell, JoinKey, RecordSet};

/// Join key column of the product catalog.
pub const PRODUCT_KEY: &str = "id";
/// Derived column: summed line-item quantities. Empty for unsold products.
pub const TOTAL_SOLD: &str = "total_sold";
/// Derived column: number of distinct buyers. Zero for unsold products.
pub const UNIQUE_BUYERS_COUNT: &str = "unique_buyers_count";

/// Sales accumulated from cart line-items, keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesTally {
    quantity_sold: HashMap<JoinKey, u64>,
    buyers: HashMap<JoinKey, HashSet<JoinKey>>,
}

impl SalesTally {
    /// Scan every line-item of every cart.
    ///
    /// # Errors
    ///
    /// Fails on the first cart or line-item that is missing a required field
    /// or holds an unconvertible key/quantity. Malformed line-items are never
    /// skipped.
    pub fn from_carts(carts: &RecordSet) -> Result<Self> {
        let mut tally = Self::default();
        for (i, record) in carts.iter().enumerate() {
            tally.add_cart(&Cart::from_record(record, i)?, i)?;
        }
        Ok(tally)
    }

    /// Add the line-items of the cart at position `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conversion`] if a product's running total would
    /// overflow `u64`. Line-items before the overflowing one stay counted.
    pub fn add_cart(&mut self, cart: &Cart, index: usize) -> Result<()> {
        for (i, item) in cart.line_items.iter().enumerate() {
            let sold = self.quantity_sold.entry(item.product_id.clone()).or_insert(0);
            *sold = sold.checked_add(item.quantity).ok_or_else(|| {
                CoreError::conversion(
                    format!("cart[{index}].products[{i}].quantity"),
                    &Value::from(item.quantity),
                    "total quantity sold overflows",
                )
            })?;
            self.buyers
                .entry(item.product_id.clone())
                .or_default()
                .insert(cart.user_id.clone());
        }
        Ok(())
    }

    /// Total quantity sold, or `None` if the product never appeared in a cart.
    #[must_use]
    pub fn total_sold(&self, product: &JoinKey) -> Option<u64> {
        self.quantity_sold.get(product).copied()
    }

    /// Number of distinct users who bought the product; 0 if none.
    #[must_use]
    pub fn unique_buyers(&self, product: &JoinKey) -> usize {
        self.buyers.get(product).map_or(0, HashSet::len)
    }

    /// Product ids that appeared in at least one line-item.
    pub fn products(&self) -> impl Iterator<Item = &JoinKey> {
        self.quantity_sold.keys()
    }
}

/// Build the product summary table.
///
/// Every catalog product appears exactly once, in catalog order, followed by
/// two derived columns:
///
/// - `total_sold`: summed quantities, left as the empty marker when the
///   product was never purchased (not coerced to 0).
/// - `unique_buyers_count`: distinct `userId`s, 0 when never purchased.
///
/// # Errors
///
/// Returns an error if any cart is malformed (see [`SalesTally::from_carts`])
/// or any catalog product lacks a usable `id`.
pub fn summarize_products(carts: &RecordSet, catalog: &RecordSet) -> Result<Table> {
    let tally = SalesTally::from_carts(carts)?;

    let mut headers = catalog.headers().to_vec();
    headers.push(TOTAL_SOLD.to_owned());
    headers.push(UNIQUE_BUYERS_COUNT.to_owned());
    let mut table = Table::new(headers);

    for (i, product) in catalog.iter().enumerate() {
        let id = product.key(PRODUCT_KEY, || format!("product[{i}]"))?;

        let mut row: Vec<Cell> = catalog
            .headers()
            .iter()
            .map(|h| Cell::from(product.get(h)))
            .collect();
        row.push(tally.total_sold(&id).map_or(Cell::Empty, Cell::from));
        row.push(Cell::from(tally.unique_buyers(&id)));
        table.push_row(row);
    }

    debug!(
        carts = carts.len(),
        products = catalog.len(),
        sold = tally.quantity_sold.len(),
        "Summarized product sales"
    );

    Ok(table)
}
