//! Error types for the stackform reconciliation engine.
//!
//! This module provides the error hierarchy for every layer of a stack
//! reconciliation: configuration, stack submissions and waits, and
//! pipeline revision lookups.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for stackform.
#[derive(Debug, Error)]
pub enum StackformError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Stack reconciliation errors.
    #[error("Stack error: {0}")]
    Stack(#[from] StackError),

    /// Pipeline lookup errors.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A required value was provided neither in the file nor on the command line.
    #[error("Missing configuration value: {name}")]
    MissingValue {
        /// Name of the missing value.
        name: String,
    },

    /// A `KEY=VALUE` stack parameter could not be parsed.
    #[error("Invalid stack parameter '{spec}': expected KEY=VALUE")]
    InvalidParameter {
        /// The offending parameter text.
        spec: String,
    },
}

/// The backend operation a submission error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOperation {
    /// `CreateStack`.
    Create,
    /// `UpdateStack`.
    Update,
}

impl fmt::Display for StackOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Classification of a rejected create/update submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitErrorKind {
    /// The update carries no changes; the stack already matches.
    NoUpdates,
    /// A create targeted a stack that already exists.
    AlreadyExists,
    /// Any other validation failure (bad template, missing parameter, ...).
    Validation,
    /// The caller lacks permission for the request.
    AccessDenied,
    /// Everything else, including transport failures.
    Other,
}

/// A create/update rejection as reported by the provisioning backend.
///
/// `code` and `message` are kept verbatim; `kind` is assigned by the backend
/// adapter that produced the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SubmitError {
    /// Classified kind.
    pub kind: SubmitErrorKind,
    /// Backend error code, when the backend supplied one.
    pub code: Option<String>,
    /// Backend error message.
    pub message: String,
}

impl SubmitError {
    /// Creates a submission error.
    #[must_use]
    pub fn new(kind: SubmitErrorKind, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Returns true if the backend rejected the request only because nothing changed.
    #[must_use]
    pub const fn is_no_updates(&self) -> bool {
        matches!(self.kind, SubmitErrorKind::NoUpdates)
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Stack reconciliation errors.
#[derive(Debug, Error)]
pub enum StackError {
    /// A create or update request was rejected.
    #[error("Failed to {operation} stack '{stack}': {source}")]
    SubmissionFailed {
        /// Stack name.
        stack: String,
        /// Operation that was rejected.
        operation: StackOperation,
        /// Backend rejection.
        source: SubmitError,
    },

    /// A backend waiter failed and the stack never left its transitional status.
    #[error("Waiting for stack '{stack}' ({waiter}) failed: {message}")]
    WaitObservationFailed {
        /// Stack name.
        stack: String,
        /// Waiter that failed.
        waiter: String,
        /// Waiter failure description.
        message: String,
    },

    /// The stack kept re-entering a transitional status.
    #[error("Stack '{stack}' still in {status} after {rounds} wait rounds")]
    StillTransitional {
        /// Stack name.
        stack: String,
        /// Last observed status.
        status: String,
        /// Number of wait rounds performed.
        rounds: u32,
    },

    /// Describing the stack failed.
    #[error("Failed to describe stack '{stack}': {message}")]
    DescribeFailed {
        /// Stack name.
        stack: String,
        /// Description of the failure.
        message: String,
    },
}

/// Pipeline lookup errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No stage action carries a source revision.
    #[error("Unable to locate source revision for pipeline '{pipeline}'")]
    SourceRevisionNotFound {
        /// Pipeline name.
        pipeline: String,
    },

    /// The pipeline state query failed.
    #[error("Failed to query state of pipeline '{pipeline}': {message}")]
    StateQueryFailed {
        /// Pipeline name.
        pipeline: String,
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for stackform operations.
pub type Result<T> = std::result::Result<T, StackformError>;

impl StackformError {
    /// Returns the backend submission error, if this is one.
    #[must_use]
    pub const fn submit_error(&self) -> Option<&SubmitError> {
        match self {
            Self::Stack(StackError::SubmissionFailed { source, .. }) => Some(source),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}
