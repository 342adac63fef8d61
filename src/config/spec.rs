//! Configuration specification types.
//!
//! This module defines the structs that map to the `stackform.yaml` file.
//! A file describes one stack: its name, template, and parameters, plus the
//! bounds placed on the backend waiters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::pipeline::DEFAULT_SOURCE_ACTION;
use crate::stack::{ParameterSet, Waiter};

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackformConfig {
    /// AWS region (uses the SDK default chain if not specified).
    #[serde(default)]
    pub region: Option<String>,
    /// The stack to reconcile.
    pub stack: StackConfig,
    /// Waiter bounds.
    #[serde(default)]
    pub waits: WaitConfig,
    /// Optional deployment pipeline used for revision lookups.
    #[serde(default)]
    pub pipeline: Option<PipelineConfig>,
}

/// Desired state of a single stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackConfig {
    /// Stack name.
    pub name: String,
    /// Path to the template file, relative to the configuration file.
    pub template: String,
    /// Stack parameters.
    #[serde(default)]
    pub parameters: ParameterSet,
}

/// Upper bounds, in seconds, for each backend waiter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WaitConfig {
    /// Bound for the stack-exists waiter.
    #[serde(default = "default_exists_secs")]
    pub exists_secs: u64,
    /// Bound for the create-complete waiter.
    #[serde(default = "default_operation_secs")]
    pub create_secs: u64,
    /// Bound for the update-complete waiter.
    #[serde(default = "default_operation_secs")]
    pub update_secs: u64,
    /// Bound for the delete-complete waiter.
    #[serde(default = "default_operation_secs")]
    pub delete_secs: u64,
    /// Bound for the import-complete and import-rollback-complete waits.
    #[serde(default = "default_operation_secs")]
    pub import_secs: u64,
    /// How many times the resolver waits before giving up on a stack that
    /// keeps re-entering an in-progress status.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

/// Deployment pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Pipeline name.
    pub name: String,
    /// Name of the action that checks out the source.
    #[serde(default = "default_source_action")]
    pub source_action: String,
}

impl WaitConfig {
    /// Default bound for the stack-exists waiter (20 polls, 5 s apart).
    pub const DEFAULT_EXISTS_SECS: u64 = 100;
    /// Default bound for operation waiters (120 polls, 30 s apart).
    pub const DEFAULT_OPERATION_SECS: u64 = 3600;
    /// Default number of resolver wait rounds.
    pub const DEFAULT_MAX_ROUNDS: u32 = 3;

    /// Returns the bound for a waiter.
    #[must_use]
    pub const fn limit_for(&self, waiter: Waiter) -> Duration {
        let secs = match waiter {
            Waiter::Exists => self.exists_secs,
            Waiter::CreateComplete => self.create_secs,
            Waiter::UpdateComplete => self.update_secs,
            Waiter::DeleteComplete => self.delete_secs,
            Waiter::ImportComplete | Waiter::ImportRollbackComplete => self.import_secs,
        };
        Duration::from_secs(secs)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            exists_secs: Self::DEFAULT_EXISTS_SECS,
            create_secs: Self::DEFAULT_OPERATION_SECS,
            update_secs: Self::DEFAULT_OPERATION_SECS,
            delete_secs: Self::DEFAULT_OPERATION_SECS,
            import_secs: Self::DEFAULT_OPERATION_SECS,
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
        }
    }
}

const fn default_exists_secs() -> u64 {
    WaitConfig::DEFAULT_EXISTS_SECS
}

const fn default_operation_secs() -> u64 {
    WaitConfig::DEFAULT_OPERATION_SECS
}

const fn default_max_rounds() -> u32 {
    WaitConfig::DEFAULT_MAX_ROUNDS
}

fn default_source_action() -> String {
    DEFAULT_SOURCE_ACTION.to_string()
}
