//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stackform - Declarative CloudFormation stack reconciler.
#[derive(Parser, Debug)]
#[command(name = "stackform")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "STACKFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update the stack to match the template and parameters.
    Upsert {
        /// Stack name (overrides the configuration file).
        #[arg(long)]
        stack: Option<String>,

        /// Template file (overrides the configuration file).
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Stack parameter as KEY=VALUE; repeatable, overrides the configuration file.
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Wait for the stack to settle and show its final status.
    Status {
        /// Stack name (overrides the configuration file).
        #[arg(long)]
        stack: Option<String>,
    },

    /// Show the source revision a pipeline is deploying.
    Revision {
        /// Pipeline name (overrides the configuration file).
        #[arg(long)]
        pipeline: Option<String>,

        /// Name of the source action.
        #[arg(long)]
        source_action: Option<String>,
    },

    /// Show the stage and action states of a pipeline.
    Stages {
        /// Pipeline name (overrides the configuration file).
        #[arg(long)]
        pipeline: Option<String>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
