//! Staged pipeline: fetch, reconcile, aggregate, persist.

use std::path::Path;
use std::time::Duration;

use shop_ledger_core::reconcile::CLIENT_KEY;
use shop_ledger_core::{
    Cart, CoreError, EmptyInput, JoinKey, RecordSet, empty_inputs, expand_products,
    expand_users, reconcile_users, summarize_products,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::ConfigError;
use crate::sink::{CsvSink, Sink, SinkError, read_table};
use crate::source::{RecordSource, SourceError, distinct};

/// Any failure that aborts a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("Reconciliation error: {0}")]
    Core(#[from] CoreError),
}

/// Record counts of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub clients: usize,
    pub carts: usize,
    pub user_profiles: usize,
    pub products: usize,
    pub user_rows: usize,
    pub product_rows: usize,
    pub empty_inputs: Vec<EmptyInput>,
}

/// Runs the stages in order against one source and one sink.
#[derive(Debug)]
pub struct Pipeline<S, K> {
    source: S,
    sink: K,
    stage_delay: Duration,
}

impl<S, K> Pipeline<S, K>
where
    S: RecordSource,
    K: Sink,
{
    #[must_use]
    pub const fn new(source: S, sink: K, stage_delay: Duration) -> Self {
        Self {
            source,
            sink,
            stage_delay,
        }
    }

    /// Give back the sink, e.g. to inspect what was written.
    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Fetch all inputs, build both tables and hand them to the sink.
    ///
    /// Profiles are requested for the scraped client IDs and products for
    /// the product ids referenced by carts. Empty inputs are logged and the
    /// run continues.
    ///
    /// # Errors
    ///
    /// Fails on the first source, reconciliation or sink error. Nothing is
    /// written unless both tables were built.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let clients = self.source.clients().await?;
        info!(count = clients.len(), "Stage 1/4: clients");
        self.pause().await;

        let carts = self.source.carts().await?;
        info!(count = carts.len(), "Stage 2/4: carts");
        self.pause().await;

        let profiles = self.source.user_profiles(&client_ids(&clients)?).await?;
        info!(count = profiles.len(), "Stage 3/4: user profiles");
        self.pause().await;

        let catalog = self.source.products(&product_ids(&carts)?).await?;
        info!(count = catalog.len(), "Stage 4/4: products");

        let empty = empty_inputs(&clients, &carts, &profiles, &catalog);
        for input in &empty {
            warn!(%input, "Empty input, continuing");
        }

        let users = reconcile_users(&clients, &profiles, &carts)?;
        let products = summarize_products(&carts, &catalog)?;

        self.sink.write_users(&users)?;
        self.sink.write_products(&products)?;

        let summary = RunSummary {
            clients: clients.len(),
            carts: carts.len(),
            user_profiles: profiles.len(),
            products: catalog.len(),
            user_rows: users.len(),
            product_rows: products.len(),
            empty_inputs: empty,
        };
        info!(
            user_rows = summary.user_rows,
            product_rows = summary.product_rows,
            "Pipeline complete"
        );
        Ok(summary)
    }

    async fn pause(&self) {
        if !self.stage_delay.is_zero() {
            tokio::time::sleep(self.stage_delay).await;
        }
    }
}

/// Distinct client IDs in table order.
///
/// # Errors
///
/// Returns an error if a client row has no usable `ID`.
pub fn client_ids(clients: &RecordSet) -> Result<Vec<JoinKey>, CoreError> {
    let ids = clients
        .iter()
        .enumerate()
        .map(|(i, client)| client.key(CLIENT_KEY, || format!("client[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(distinct(&ids))
}

/// Distinct product ids referenced by cart line-items, in first-seen order.
///
/// # Errors
///
/// Returns an error if any cart or line-item is malformed.
pub fn product_ids(carts: &RecordSet) -> Result<Vec<JoinKey>, CoreError> {
    let mut ids = Vec::new();
    for (i, record) in carts.iter().enumerate() {
        ids.extend(
            Cart::from_record(record, i)?
                .line_items
                .into_iter()
                .map(|item| item.product_id),
        );
    }
    Ok(distinct(&ids))
}

/// Rewrite the persisted tables in `dir` with nested columns flattened.
///
/// # Errors
///
/// Returns an error if either file cannot be read, expanded or rewritten.
#[instrument]
pub fn expand_outputs(dir: &Path) -> Result<(), PipelineError> {
    let mut sink = CsvSink::new(dir);

    let users = expand_users(&read_table(&sink.users_path())?)?;
    let products = expand_products(&read_table(&sink.products_path())?)?;

    sink.write_users(&users)?;
    sink.write_products(&products)?;
    info!(
        user_columns = users.headers().len(),
        product_columns = products.headers().len(),
        "Expanded output tables"
    );
    Ok(())
}
