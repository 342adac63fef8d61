//! Deployment pipeline lookups.
//!
//! Independent of the stack state machine: reads a pipeline's stage states
//! to find the source revision it is deploying.

mod codepipeline;
mod lister;
mod revision;
mod types;

pub use codepipeline::CodePipelineLister;
pub use lister::PipelineStateLister;
pub use revision::{RevisionLocator, DEFAULT_SOURCE_ACTION};
pub use types::{ActionRevision, ActionState, StageState};
