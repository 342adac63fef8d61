//! Diagnostic events emitted by the reconciliation core.
//!
//! The resolver and the upserter never log directly. They report
//! [`StackEvent`]s to a [`StackObserver`] handed to them at construction;
//! [`TracingObserver`] forwards events to `tracing`, and
//! [`RecordingObserver`] keeps them for inspection.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

use super::backend::Waiter;
use super::status::{StatusCode, Transition};

/// Something that happened while reconciling a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StackEvent {
    /// The stack status was observed.
    StatusObserved {
        /// Stack name.
        stack: String,
        /// Observed status.
        status: StatusCode,
    },
    /// Describing the stack failed; the stack is treated as absent.
    DescribeFailed {
        /// Stack name.
        stack: String,
        /// Failure description.
        message: String,
    },
    /// The backend reported a status missing from the status table.
    UnrecognizedStatus {
        /// Stack name.
        stack: String,
        /// Raw status string.
        status: String,
    },
    /// Waiting for an in-flight operation to settle.
    WaitStarted {
        /// Stack name.
        stack: String,
        /// Status that triggered the wait.
        status: StatusCode,
        /// Operation family being waited on.
        transition: Transition,
        /// Waiter used.
        waiter: Waiter,
    },
    /// A waiter returned an error.
    WaitFailed {
        /// Stack name.
        stack: String,
        /// Waiter used.
        waiter: Waiter,
        /// Failure description.
        message: String,
    },
    /// The stack settled.
    Resolved {
        /// Stack name.
        stack: String,
        /// Terminal status.
        status: StatusCode,
    },
    /// The stack does not exist.
    Absent {
        /// Stack name.
        stack: String,
    },
    /// A create request is about to be submitted.
    Creating {
        /// Stack name.
        stack: String,
        /// Submitted parameters, as `KEY=VALUE`.
        parameters: Vec<String>,
        /// Short template digest.
        template_digest: String,
        /// Client request token.
        request_token: String,
    },
    /// The create request was accepted and the stack exists.
    Created {
        /// Stack name.
        stack: String,
    },
    /// An update request is about to be submitted.
    Updating {
        /// Stack name.
        stack: String,
        /// Status before the update.
        prior_status: StatusCode,
        /// Submitted parameters, as `KEY=VALUE`.
        parameters: Vec<String>,
        /// Short template digest.
        template_digest: String,
        /// Client request token.
        request_token: String,
    },
    /// The update request was accepted.
    UpdateSubmitted {
        /// Stack name.
        stack: String,
    },
    /// The backend reported nothing to update.
    NoChanges {
        /// Stack name.
        stack: String,
    },
    /// A create or update request was rejected.
    SubmissionRejected {
        /// Stack name.
        stack: String,
        /// Backend error code.
        code: Option<String>,
        /// Backend error message.
        message: String,
    },
}

/// A recorded event with the time it was observed.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedEvent {
    /// When the event was observed.
    pub at: DateTime<Utc>,
    /// The event.
    pub event: StackEvent,
}

/// Receiver of [`StackEvent`]s.
pub trait StackObserver: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &StackEvent);
}

/// Observer that forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StackObserver for TracingObserver {
    fn on_event(&self, event: &StackEvent) {
        match event {
            StackEvent::StatusObserved { stack, status } => {
                debug!("Stack {stack} current status={status}");
            }
            StackEvent::DescribeFailed { stack, message } => {
                warn!("Describing stack {stack} failed, treating as absent: {message}");
            }
            StackEvent::UnrecognizedStatus { stack, status } => {
                warn!("Stack {stack} reported unrecognized status {status}, treating as final");
            }
            StackEvent::WaitStarted {
                stack,
                status,
                transition,
                waiter,
            } => {
                debug!("Waiting for stack {stack} to finish {transition} ({waiter})... current status={status}");
            }
            StackEvent::WaitFailed {
                stack,
                waiter,
                message,
            } => {
                warn!("Waiter {waiter} for stack {stack} failed: {message}");
            }
            StackEvent::Resolved { stack, status } => {
                debug!("Returning final status for stack {stack}: {status}");
            }
            StackEvent::Absent { stack } => {
                debug!("Stack {stack} doesn't exist");
            }
            StackEvent::Creating {
                stack,
                parameters,
                template_digest,
                request_token,
            } => {
                debug!(
                    "Creating stack {stack} (template {template_digest}, token {request_token}) parameters: [{}]",
                    parameters.join(", ")
                );
            }
            StackEvent::Created { stack } => {
                info!("Stack {stack} created");
            }
            StackEvent::Updating {
                stack,
                prior_status,
                parameters,
                template_digest,
                request_token,
            } => {
                debug!(
                    "Updating stack {stack} from {prior_status} (template {template_digest}, token {request_token}) parameters: [{}]",
                    parameters.join(", ")
                );
            }
            StackEvent::UpdateSubmitted { stack } => {
                info!("Update submitted for stack {stack}");
            }
            StackEvent::NoChanges { stack } => {
                info!("No changes for stack {stack}");
            }
            StackEvent::SubmissionRejected {
                stack,
                code,
                message,
            } => {
                debug!(
                    "Submission for stack {stack} rejected: {} {message}",
                    code.as_deref().unwrap_or("-")
                );
            }
        }
    }
}

/// Observer that records every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Returns the recorded events in order.
    #[must_use]
    pub fn events(&self) -> Vec<StackEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|recorded| recorded.event.clone())
            .collect()
    }

    /// Returns the recorded events with their timestamps.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StackObserver for RecordingObserver {
    fn on_event(&self, event: &StackEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEvent {
                at: Utc::now(),
                event: event.clone(),
            });
    }
}

/// Observer that forwards each event to two observers.
pub struct Tee<'a> {
    first: &'a dyn StackObserver,
    second: &'a dyn StackObserver,
}

impl<'a> Tee<'a> {
    /// Creates a tee over two observers.
    #[must_use]
    pub const fn new(first: &'a dyn StackObserver, second: &'a dyn StackObserver) -> Self {
        Self { first, second }
    }
}

impl StackObserver for Tee<'_> {
    fn on_event(&self, event: &StackEvent) {
        self.first.on_event(event);
        self.second.on_event(event);
    }
}
