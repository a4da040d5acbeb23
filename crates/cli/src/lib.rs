//! Shop Ledger CLI library - configuration, record sources, sinks and the
//! staged pipeline behind the `shop-ledger` binary.
//!
//! # Architecture
//!
//! - [`source`] - where the four inputs come from (live HTTP or fixtures)
//! - [`sink`] - where the two output tables go (CSV files)
//! - [`pipeline`] - fetch, reconcile, aggregate and persist in sequence
//! - [`config`] - environment-driven settings
//!
//! Reconciliation and aggregation live in `shop-ledger-core`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod pipeline;
pub mod sink;
pub mod source;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{Pipeline, PipelineError, RunSummary, expand_outputs};
pub use sink::{CsvSink, Sink, SinkError};
pub use source::{FixtureSource, LiveSource, RecordSource, SourceError};
