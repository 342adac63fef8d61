//! Provisioning backend trait definition.
//!
//! This module defines the interface the reconciliation core consumes. The
//! CloudFormation adapter implements it against AWS; tests implement it with
//! mocks.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::error::{StackError, SubmitError};

use super::params::StackParameter;
use super::status::StatusCode;
use super::template::TemplateBody;

/// A capability the caller acknowledges on every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Capability {
    /// The template may create IAM resources.
    #[serde(rename = "CAPABILITY_IAM")]
    Iam,
}

impl Capability {
    /// Returns the backend string for this capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iam => "CAPABILITY_IAM",
        }
    }
}

/// A native backend waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Waiter {
    /// The stack is queryable.
    Exists,
    /// A create (or create rollback) has settled.
    CreateComplete,
    /// An update (or update rollback) has settled.
    UpdateComplete,
    /// A delete has settled.
    DeleteComplete,
    /// An import has settled.
    ImportComplete,
    /// An import rollback has settled. The SDK has no native waiter for
    /// this, so backends poll the stack status instead.
    ImportRollbackComplete,
}

impl fmt::Display for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => write!(f, "stack-exists"),
            Self::CreateComplete => write!(f, "stack-create-complete"),
            Self::UpdateComplete => write!(f, "stack-update-complete"),
            Self::DeleteComplete => write!(f, "stack-delete-complete"),
            Self::ImportComplete => write!(f, "stack-import-complete"),
            Self::ImportRollbackComplete => write!(f, "stack-import-rollback-complete"),
        }
    }
}

/// A create or update submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRequest {
    /// Stack name.
    pub stack_name: String,
    /// Full template document.
    pub template_body: TemplateBody,
    /// Parameters, ordered by key.
    pub parameters: Vec<StackParameter>,
    /// Acknowledged capabilities.
    pub capabilities: Vec<Capability>,
    /// Idempotency token for this submission.
    pub client_request_token: String,
}

/// Interface to the provisioning backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackBackend: Send + Sync {
    /// Reads the current status of a stack.
    ///
    /// Returns `None` when the backend reports no matching stack.
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StatusCode>, StackError>;

    /// Submits a create request.
    async fn create_stack(&self, request: &StackRequest) -> Result<(), SubmitError>;

    /// Submits an update request.
    async fn update_stack(&self, request: &StackRequest) -> Result<(), SubmitError>;

    /// Suspends until the given waiter succeeds, fails, or gives up.
    async fn wait(&self, stack_name: &str, waiter: Waiter) -> Result<(), StackError>;
}

#[async_trait]
impl<B: StackBackend + ?Sized> StackBackend for Box<B> {
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StatusCode>, StackError> {
        (**self).describe_stack(stack_name).await
    }

    async fn create_stack(&self, request: &StackRequest) -> Result<(), SubmitError> {
        (**self).create_stack(request).await
    }

    async fn update_stack(&self, request: &StackRequest) -> Result<(), SubmitError> {
        (**self).update_stack(request).await
    }

    async fn wait(&self, stack_name: &str, waiter: Waiter) -> Result<(), StackError> {
        (**self).wait(stack_name, waiter).await
    }
}
