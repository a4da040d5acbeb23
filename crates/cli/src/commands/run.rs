//! Full pipeline run.
//!
//! # Usage
//!
//! ```bash
//! # Scrape and fetch live data, writing CSVs to the current directory
//! shop-ledger run
//!
//! # Offline run over a fixture directory
//! shop-ledger run --fixtures ./fixtures --output-dir ./out
//!
//! # Live run without the politeness pauses
//! shop-ledger run --no-delay
//! ```
//!
//! # Environment Variables
//!
//! See [`shop_ledger_cli::config`].

use std::path::PathBuf;

use shop_ledger_cli::{
    CsvSink, FixtureSource, LiveSource, Pipeline, PipelineConfig, PipelineError, RunSummary,
};

/// Overrides taken from the command line.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub output_dir: Option<PathBuf>,
    pub fixtures: Option<PathBuf>,
    pub no_delay: bool,
}

/// Load configuration, apply `options` and run the pipeline.
///
/// Fixture runs never pause.
pub async fn run(options: RunOptions) -> Result<RunSummary, PipelineError> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(dir) = options.output_dir {
        config.output_dir = dir;
    }
    if options.no_delay || options.fixtures.is_some() {
        config = config.without_delays();
    }

    tracing::info!(output_dir = %config.output_dir.display(), "Starting pipeline run");
    let sink = CsvSink::new(&config.output_dir);

    match options.fixtures {
        Some(dir) => {
            tracing::info!(fixtures = %dir.display(), "Using fixture source");
            Pipeline::new(FixtureSource::new(dir), sink, config.stage_delay)
                .run()
                .await
        }
        None => {
            let source = LiveSource::new(&config)?;
            Pipeline::new(source, sink, config.stage_delay).run().await
        }
    }
}
