//! Subcommand implementations.

pub mod expand;
pub mod run;
