//! Record and cell types shared by the reconciliation core.
//!
//! Everything here is an immutable value materialized once per run.

pub mod cart;
pub mod cell;
pub mod key;
pub mod record;

pub use cart::{Cart, LineItem};
pub use cell::Cell;
pub use key::JoinKey;
pub use record::{Record, RecordSet};
