//! Flatten nested columns of previously written output files.
//!
//! # Usage
//!
//! ```bash
//! shop-ledger expand --output-dir ./out
//! ```

use std::path::PathBuf;

use shop_ledger_cli::{PipelineConfig, PipelineError, expand_outputs};

/// Rewrite both CSV files in `output_dir` (or the configured directory).
pub fn expand(output_dir: Option<PathBuf>) -> Result<(), PipelineError> {
    let dir = match output_dir {
        Some(dir) => dir,
        None => PipelineConfig::from_env()?.output_dir,
    };
    expand_outputs(&dir)
}
