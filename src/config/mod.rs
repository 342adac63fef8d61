//! Configuration module for stackform.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `stackform.yaml`
//! - Validation of configuration values
//! - Loading the shared AWS SDK configuration

mod aws;
mod parser;
mod spec;
mod validator;

pub use aws::load_sdk_config;
pub use parser::{ConfigParser, DEFAULT_CONFIG_FILES, find_config_file};
pub use spec::{PipelineConfig, StackConfig, StackformConfig, WaitConfig};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
