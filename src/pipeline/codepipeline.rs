//! CodePipeline-backed pipeline state lister.

use async_trait::async_trait;
use aws_sdk_codepipeline::Client;
use aws_sdk_codepipeline::error::DisplayErrorContext;
use aws_sdk_codepipeline::types as sdk;
use tracing::debug;

use crate::error::PipelineError;

use super::lister::PipelineStateLister;
use super::types::{ActionRevision, ActionState, StageState};

/// Pipeline state lister talking to AWS CodePipeline.
#[derive(Debug, Clone)]
pub struct CodePipelineLister {
    /// CodePipeline client.
    client: Client,
}

impl CodePipelineLister {
    /// Creates a lister from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self::with_client(Client::new(config))
    }

    /// Creates a lister with an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn to_stage_state(stage: &sdk::StageState) -> StageState {
        StageState {
            stage_name: stage.stage_name().unwrap_or_default().to_string(),
            action_states: stage
                .action_states()
                .iter()
                .map(Self::to_action_state)
                .collect(),
        }
    }

    fn to_action_state(action: &sdk::ActionState) -> ActionState {
        ActionState {
            action_name: action.action_name().unwrap_or_default().to_string(),
            current_revision: action.current_revision().map(|revision| ActionRevision {
                revision_id: revision.revision_id().to_string(),
            }),
            latest_status: action
                .latest_execution()
                .and_then(sdk::ActionExecution::status)
                .map(|status| status.as_str().to_string()),
        }
    }
}

#[async_trait]
impl PipelineStateLister for CodePipelineLister {
    async fn list_state(&self, pipeline_name: &str) -> Result<Vec<StageState>, PipelineError> {
        debug!("Searching for pipeline state for pipeline named '{pipeline_name}'");

        let output = self
            .client
            .get_pipeline_state()
            .name(pipeline_name)
            .send()
            .await
            .map_err(|err| PipelineError::StateQueryFailed {
                pipeline: pipeline_name.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(output
            .stage_states()
            .iter()
            .map(Self::to_stage_state)
            .collect())
    }
}
