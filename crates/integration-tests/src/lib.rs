//! Integration tests for the shop-ledger pipeline.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shop-ledger-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `pipeline_run` - fixture inputs through the full pipeline into CSV files
//! - `expand_outputs` - column flattening of written files
//!
//! Fixtures in `fixtures/` mirror the shapes returned by the live client
//! table and REST API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use shop_ledger_cli::{CsvSink, FixtureSource, Pipeline, PipelineError, RunSummary};
use tempfile::TempDir;

const FIXTURE_FILES: [&str; 4] = ["clients.json", "carts.json", "users.json", "products.json"];

/// Directory holding the bundled fixtures.
#[must_use]
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// A scratch directory with a private copy of the fixtures and an output
/// directory that does not exist yet.
pub struct TestWorkspace {
    root: TempDir,
}

impl TestWorkspace {
    /// # Panics
    ///
    /// Panics if the temp directory or fixture copies cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let fixtures = root.path().join("fixtures");
        std::fs::create_dir(&fixtures).expect("create fixture dir");
        for file in FIXTURE_FILES {
            std::fs::copy(fixtures_dir().join(file), fixtures.join(file)).expect("copy fixture");
        }
        Self { root }
    }

    #[must_use]
    pub fn fixtures(&self) -> PathBuf {
        self.root.path().join("fixtures")
    }

    #[must_use]
    pub fn output(&self) -> PathBuf {
        self.root.path().join("out")
    }

    /// Replace one fixture file.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_fixture(&self, file: &str, value: &Value) {
        std::fs::write(self.fixtures().join(file), value.to_string()).expect("write fixture");
    }

    /// Run the pipeline over the fixtures into [`TestWorkspace::output`].
    ///
    /// # Errors
    ///
    /// Returns the pipeline's error unchanged.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let source = FixtureSource::new(self.fixtures());
        let sink = CsvSink::new(self.output());
        Pipeline::new(source, sink, Duration::ZERO).run().await
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
