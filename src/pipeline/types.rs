//! Pipeline state types.

use serde::Serialize;

/// Current revision of a pipeline action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRevision {
    /// Revision identifier (commit id, object version, ...).
    pub revision_id: String,
}

/// State of one action within a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionState {
    /// Action name.
    pub action_name: String,
    /// Revision the action is currently working with.
    pub current_revision: Option<ActionRevision>,
    /// Status of the latest execution, if any.
    pub latest_status: Option<String>,
}

/// State of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageState {
    /// Stage name.
    pub stage_name: String,
    /// Actions in execution order.
    pub action_states: Vec<ActionState>,
}

impl ActionState {
    /// Returns the current revision id, if there is one.
    #[must_use]
    pub fn revision_id(&self) -> Option<&str> {
        self.current_revision
            .as_ref()
            .map(|revision| revision.revision_id.as_str())
    }
}
