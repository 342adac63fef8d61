//! Source revision lookup.

use tracing::debug;

use crate::error::PipelineError;

use super::lister::PipelineStateLister;
use super::types::StageState;

/// Default name of the action that checks out the source.
pub const DEFAULT_SOURCE_ACTION: &str = "Source";

/// Finds the revision a pipeline is deploying.
pub struct RevisionLocator<'a, L: PipelineStateLister + ?Sized> {
    /// Pipeline state source.
    lister: &'a L,
    /// Name of the source action.
    source_action: String,
}

impl<'a, L: PipelineStateLister + ?Sized> RevisionLocator<'a, L> {
    /// Creates a locator looking for the default `Source` action.
    #[must_use]
    pub fn new(lister: &'a L) -> Self {
        Self {
            lister,
            source_action: DEFAULT_SOURCE_ACTION.to_string(),
        }
    }

    /// Sets the name of the source action.
    #[must_use]
    pub fn with_source_action(mut self, name: impl Into<String>) -> Self {
        self.source_action = name.into();
        self
    }

    /// Returns the current revision id of the pipeline's source action.
    ///
    /// # Errors
    ///
    /// Returns an error if the state query fails or no stage has a source
    /// action with a current revision.
    pub async fn source_revision(&self, pipeline_name: &str) -> Result<String, PipelineError> {
        debug!("Searching for source revision of pipeline {pipeline_name}");

        let stages = self.lister.list_state(pipeline_name).await?;

        find_revision(&stages, &self.source_action)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::SourceRevisionNotFound {
                pipeline: pipeline_name.to_string(),
            })
    }
}

/// Scans stages, then actions, in order for the first named action with a revision.
fn find_revision<'s>(stages: &'s [StageState], action_name: &str) -> Option<&'s str> {
    stages
        .iter()
        .flat_map(|stage| &stage.action_states)
        .filter(|action| action.action_name == action_name)
        .find_map(super::types::ActionState::revision_id)
}
