//! Shop Ledger Core - record types and the reconciliation/aggregation core.
//!
//! This crate turns four already-fetched record sets into two output tables:
//!
//! - [`reconcile::reconcile_users`] - profiles ⟗ scraped clients, plus `cart_count`
//! - [`aggregate::summarize_products`] - catalog plus `total_sold` and
//!   `unique_buyers_count`
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no network, no
//! filesystem, no process-wide state. Fetching and persisting belong to the
//! `shop-ledger-cli` crate.
//!
//! # Modules
//!
//! - [`types`] - join keys, records, carts and output cells
//! - [`table`] - the output table handed to a sink
//! - [`reconcile`] - user reconciliation
//! - [`aggregate`] - product sales aggregation
//! - [`expand`] - optional flattening of nested columns
//! - [`error`] - error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod aggregate;
pub mod error;
pub mod expand;
pub mod reconcile;
pub mod table;
pub mod types;

pub use aggregate::{SalesTally, summarize_products};
pub use error::{CoreError, EmptyInput, Result, empty_inputs};
pub use expand::{expand_products, expand_users};
pub use reconcile::reconcile_users;
pub use table::Table;
pub use types::*;
