//! CLI module for stackform.
//!
//! This module provides the command-line interface for reconciling
//! stacks and querying pipelines.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
