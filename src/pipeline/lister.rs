//! Pipeline state lister trait definition.

use async_trait::async_trait;

use crate::error::PipelineError;

use super::types::StageState;

/// Read-only access to a deployment pipeline's state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineStateLister: Send + Sync {
    /// Lists the pipeline's stage states in pipeline order.
    async fn list_state(&self, pipeline_name: &str) -> Result<Vec<StageState>, PipelineError>;
}
