// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Stackform
//!
//! Idempotent create-or-update reconciliation for `CloudFormation` stacks,
//! plus source revision lookups for the pipeline that deploys them.
//!
//! ## Overview
//!
//! Given a stack name, a template and a parameter set, stackform:
//!
//! - Waits out any in-progress operation on the stack
//! - Creates the stack if it does not exist
//! - Submits an update otherwise, treating "no updates" as success
//!
//! ## Architecture
//!
//! The reconciliation core talks to the backend only through the
//! [`stack::StackBackend`] trait and reports progress as structured
//! [`stack::StackEvent`] values to an injected [`stack::StackObserver`]:
//!
//! 1. **Status Resolver**: blocks until the stack is absent or terminal
//! 2. **Upsert Coordinator**: creates or updates based on the resolved status
//! 3. **Revision Locator**: finds the source revision a pipeline is running
//!
//! ## Modules
//!
//! - [`config`]: Configuration parsing and validation
//! - [`stack`]: Status resolution, upsert and the `CloudFormation` backend
//! - [`pipeline`]: Pipeline state listing and revision lookup
//! - [`error`]: Error types
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! region: eu-west-1
//! stack:
//!   name: app-stack
//!   template: templates/app.yml
//!   parameters:
//!     Env: prod
//! pipeline:
//!   name: app-pipeline
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stack;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, StackformConfig, WaitConfig};
pub use error::{Result, StackformError};
pub use pipeline::{CodePipelineLister, PipelineStateLister, RevisionLocator};
pub use stack::{
    CloudFormationBackend, ParameterSet, StackBackend, StackObserver, StackStatus,
    StackUpserter, StatusResolver, TemplateBody, UpsertOutcome,
};
