//! Configuration validation.
//!
//! Checks a loaded configuration before any backend call is made. The
//! reconciliation core itself does not validate names or parameters; these
//! checks only catch obviously broken configuration files early.

use crate::error::{ConfigError, Result, StackformError};
use tracing::debug;

use super::spec::{StackformConfig, WaitConfig};

/// Maximum stack name length accepted by CloudFormation.
const MAX_STACK_NAME_LEN: usize = 128;

/// Validator for stack configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ValidationResult {
    /// Returns true if no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a stack configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self, config: &StackformConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_stack(config, &mut result);
        Self::validate_waits(&config.waits, &mut result);
        Self::validate_pipeline(config, &mut result);

        if result.is_valid() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(StackformError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )))
        }
    }

    fn validate_stack(config: &StackformConfig, result: &mut ValidationResult) {
        let name = &config.stack.name;
        if name.is_empty() {
            result.error("stack.name", "Stack name cannot be empty");
        } else if !is_valid_stack_name(name) {
            result.error(
                "stack.name",
                format!(
                    "Stack name '{name}' is invalid. Must start with a letter and contain only letters, digits and hyphens (max {MAX_STACK_NAME_LEN})."
                ),
            );
        }

        if config.stack.template.trim().is_empty() {
            result.error("stack.template", "Template path cannot be empty");
        }

        if config.stack.parameters.is_empty() {
            result
                .warnings
                .push(String::from("No stack parameters configured"));
        }
    }

    fn validate_waits(waits: &WaitConfig, result: &mut ValidationResult) {
        let bounds = [
            ("waits.exists_secs", waits.exists_secs),
            ("waits.create_secs", waits.create_secs),
            ("waits.update_secs", waits.update_secs),
            ("waits.delete_secs", waits.delete_secs),
            ("waits.import_secs", waits.import_secs),
        ];

        for (field, secs) in bounds {
            if secs == 0 {
                result.error(field, "Wait bound must be greater than zero");
            }
        }

        if waits.max_rounds == 0 {
            result.error("waits.max_rounds", "At least one wait round is required");
        }
    }

    fn validate_pipeline(config: &StackformConfig, result: &mut ValidationResult) {
        if let Some(pipeline) = &config.pipeline {
            if pipeline.name.is_empty() {
                result.error("pipeline.name", "Pipeline name cannot be empty");
            }
            if pipeline.source_action.is_empty() {
                result.error("pipeline.source_action", "Source action name cannot be empty");
            }
        }
    }
}

/// Checks a name against the CloudFormation stack name pattern.
fn is_valid_stack_name(name: &str) -> bool {
    name.len() <= MAX_STACK_NAME_LEN
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineConfig, StackConfig};
    use crate::stack::ParameterSet;

    fn config(name: &str) -> StackformConfig {
        StackformConfig {
            region: None,
            stack: StackConfig {
                name: name.to_string(),
                template: String::from("template.yml"),
                parameters: [("Env", "dev")].into_iter().collect::<ParameterSet>(),
            },
            waits: WaitConfig::default(),
            pipeline: None,
        }
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_stack_name("demo-stack"));
        assert!(is_valid_stack_name("App2"));
    }

    #[test]
    fn test_invalid_name() {
        assert!(!is_valid_stack_name("2fast"));
        assert!(!is_valid_stack_name("under_score"));
        assert!(!is_valid_stack_name(&"a".repeat(MAX_STACK_NAME_LEN + 1)));
    }

    #[test]
    fn test_valid_config_passes() {
        let result = ConfigValidator::new()
            .validate(&config("demo-stack"))
            .expect("valid");
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_config_reports_field() {
        let err = ConfigValidator::new()
            .validate(&config(""))
            .expect_err("invalid");

        assert!(matches!(
            err,
            StackformError::Config(ConfigError::ValidationError { field: Some(ref f), .. }) if f == "stack.name"
        ));
    }

    #[test]
    fn test_zero_wait_bound_rejected() {
        let mut cfg = config("demo-stack");
        cfg.waits.update_secs = 0;
        assert!(ConfigValidator::new().validate(&cfg).is_err());

        let mut cfg = config("demo-stack");
        cfg.waits.max_rounds = 0;
        assert!(ConfigValidator::new().validate(&cfg).is_err());
    }

    #[test]
    fn test_empty_pipeline_name_rejected() {
        let mut cfg = config("demo-stack");
        cfg.pipeline = Some(PipelineConfig {
            name: String::new(),
            source_action: String::from("Source"),
        });
        assert!(ConfigValidator::new().validate(&cfg).is_err());
    }
}
