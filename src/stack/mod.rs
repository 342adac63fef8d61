//! Stack reconciliation module.
//!
//! This module holds the reconciliation core: the status table, the status
//! resolver that waits out in-flight operations, and the upserter that
//! chooses between create and update. The provisioning backend sits behind
//! the [`StackBackend`] trait, with a CloudFormation implementation.

mod backend;
mod cloudformation;
mod events;
mod params;
mod resolver;
mod status;
mod template;
mod upsert;

pub use backend::{Capability, StackBackend, StackRequest, Waiter};
pub use cloudformation::{classify, CloudFormationBackend};
pub use events::{RecordedEvent, RecordingObserver, StackEvent, StackObserver, Tee, TracingObserver};
pub use params::{ParameterSet, StackParameter};
pub use resolver::StatusResolver;
pub use status::{Phase, StackStatus, StatusCode, Transition};
pub use template::TemplateBody;
pub use upsert::{StackUpserter, UpsertOutcome};
