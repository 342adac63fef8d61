//! CloudFormation-backed stack backend.
//!
//! This module implements [`StackBackend`] with the AWS SDK, using the SDK's
//! native waiters for every blocking wait.

use async_trait::async_trait;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::client::Waiters;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::types::{Capability as CfnCapability, Parameter};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::config::WaitConfig;
use crate::error::{StackError, SubmitError, SubmitErrorKind};

use super::backend::{Capability, StackBackend, StackRequest, Waiter};
use super::status::StatusCode;

/// Error code the backend uses for request validation failures.
const VALIDATION_ERROR: &str = "ValidationError";

/// Message the backend sends when an update changes nothing.
const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";

/// Message fragment the backend sends when describing an unknown stack.
const DOES_NOT_EXIST: &str = "does not exist";

/// Delay between status polls while an import rolls back. Matches the
/// minimum delay of the SDK's import-complete waiter.
const IMPORT_ROLLBACK_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Stack backend talking to AWS CloudFormation.
#[derive(Debug, Clone)]
pub struct CloudFormationBackend {
    /// CloudFormation client.
    client: Client,
    /// Waiter bounds.
    waits: WaitConfig,
}

impl CloudFormationBackend {
    /// Creates a backend from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig, waits: WaitConfig) -> Self {
        Self::with_client(Client::new(config), waits)
    }

    /// Creates a backend with an existing client.
    #[must_use]
    pub fn with_client(client: Client, waits: WaitConfig) -> Self {
        Self { client, waits }
    }

    fn to_sdk_parameters(request: &StackRequest) -> Vec<Parameter> {
        request
            .parameters
            .iter()
            .map(|p| {
                Parameter::builder()
                    .parameter_key(&p.key)
                    .parameter_value(&p.value)
                    .build()
            })
            .collect()
    }

    fn to_sdk_capabilities(request: &StackRequest) -> Vec<CfnCapability> {
        request
            .capabilities
            .iter()
            .map(|c| match c {
                Capability::Iam => CfnCapability::CapabilityIam,
            })
            .collect()
    }
}

#[async_trait]
impl StackBackend for CloudFormationBackend {
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StatusCode>, StackError> {
        trace!("DescribeStacks {stack_name}");

        match self.client.describe_stacks().stack_name(stack_name).send().await {
            Ok(output) => match output.stacks() {
                [stack] => Ok(stack
                    .stack_status()
                    .map(|status| StatusCode::from_raw(status.as_str()))),
                _ => Ok(None),
            },
            Err(err) => {
                if err.code() == Some(VALIDATION_ERROR)
                    && err.message().is_some_and(|m| m.contains(DOES_NOT_EXIST))
                {
                    return Ok(None);
                }
                Err(StackError::DescribeFailed {
                    stack: stack_name.to_string(),
                    message: DisplayErrorContext(&err).to_string(),
                })
            }
        }
    }

    async fn create_stack(&self, request: &StackRequest) -> Result<(), SubmitError> {
        debug!("CreateStack {}", request.stack_name);

        self.client
            .create_stack()
            .stack_name(&request.stack_name)
            .template_body(request.template_body.as_str())
            .set_parameters(Some(Self::to_sdk_parameters(request)))
            .set_capabilities(Some(Self::to_sdk_capabilities(request)))
            .client_request_token(&request.client_request_token)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| submit_error(&err))
    }

    async fn update_stack(&self, request: &StackRequest) -> Result<(), SubmitError> {
        debug!("UpdateStack {}", request.stack_name);

        self.client
            .update_stack()
            .stack_name(&request.stack_name)
            .template_body(request.template_body.as_str())
            .set_parameters(Some(Self::to_sdk_parameters(request)))
            .set_capabilities(Some(Self::to_sdk_capabilities(request)))
            .client_request_token(&request.client_request_token)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| submit_error(&err))
    }

    async fn wait(&self, stack_name: &str, waiter: Waiter) -> Result<(), StackError> {
        let max_wait = self.waits.limit_for(waiter);
        debug!("Waiting up to {}s for {waiter} on {stack_name}", max_wait.as_secs());

        let result = match waiter {
            Waiter::Exists => settled(
                self.client
                    .wait_until_stack_exists()
                    .stack_name(stack_name)
                    .wait(max_wait)
                    .await,
            ),
            Waiter::CreateComplete => settled(
                self.client
                    .wait_until_stack_create_complete()
                    .stack_name(stack_name)
                    .wait(max_wait)
                    .await,
            ),
            Waiter::UpdateComplete => settled(
                self.client
                    .wait_until_stack_update_complete()
                    .stack_name(stack_name)
                    .wait(max_wait)
                    .await,
            ),
            Waiter::DeleteComplete => settled(
                self.client
                    .wait_until_stack_delete_complete()
                    .stack_name(stack_name)
                    .wait(max_wait)
                    .await,
            ),
            Waiter::ImportComplete => settled(
                self.client
                    .wait_until_stack_import_complete()
                    .stack_name(stack_name)
                    .wait(max_wait)
                    .await,
            ),
            Waiter::ImportRollbackComplete => {
                poll_while(
                    || self.describe_stack(stack_name),
                    &StatusCode::ImportRollbackInProgress,
                    IMPORT_ROLLBACK_POLL_INTERVAL,
                    max_wait,
                )
                .await
            }
        };

        result.map_err(|message| StackError::WaitObservationFailed {
            stack: stack_name.to_string(),
            waiter: waiter.to_string(),
            message,
        })
    }

}

/// Polls the stack status until it leaves `pending` or `max_wait` elapses.
///
/// Any other status, including absence, counts as settled; the resolver
/// decides what to do with it.
async fn poll_while<F, Fut>(
    mut describe: F,
    pending: &StatusCode,
    interval: Duration,
    max_wait: Duration,
) -> Result<(), String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<StatusCode>, StackError>>,
{
    let deadline = Instant::now() + max_wait;

    loop {
        match describe().await {
            Ok(Some(status)) if status == *pending => {
                trace!("Stack still {status}");
            }
            Ok(_) => return Ok(()),
            Err(err) => return Err(err.to_string()),
        }

        if Instant::now() + interval > deadline {
            return Err(format!(
                "stack still {pending} after {}s",
                max_wait.as_secs()
            ));
        }
        sleep(interval).await;
    }
}

/// Drops a waiter's final poll, keeping only a description of any failure.
fn settled<T, E: std::error::Error>(result: Result<T, E>) -> Result<(), String> {
    result
        .map(|_| ())
        .map_err(|err| DisplayErrorContext(&err).to_string())
}

/// Converts an SDK error into a classified submission error.
fn submit_error<E>(err: &E) -> SubmitError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(err).to_string(), str::to_string);
    let kind = classify(code.as_deref(), &message);
    SubmitError::new(kind, code, message)
}

/// Classifies a create/update rejection from its code and message.
#[must_use]
pub fn classify(code: Option<&str>, message: &str) -> SubmitErrorKind {
    match code {
        Some(VALIDATION_ERROR) if message == NO_UPDATES_MESSAGE => SubmitErrorKind::NoUpdates,
        Some(VALIDATION_ERROR) => SubmitErrorKind::Validation,
        Some("AlreadyExistsException") => SubmitErrorKind::AlreadyExists,
        Some("AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation") => {
            SubmitErrorKind::AccessDenied
        }
        _ => SubmitErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::params::ParameterSet;
    use crate::stack::template::TemplateBody;

    #[test]
    fn test_no_updates_signature() {
        assert_eq!(
            classify(Some("ValidationError"), "No updates are to be performed."),
            SubmitErrorKind::NoUpdates
        );
    }

    #[test]
    fn test_other_validation_errors_are_not_no_ops() {
        assert_eq!(
            classify(Some("ValidationError"), "Parameter X is required"),
            SubmitErrorKind::Validation
        );
        assert_eq!(
            classify(Some("ValidationError"), "No updates are to be performed"),
            SubmitErrorKind::Validation
        );
        assert_eq!(
            classify(Some("Throttling"), "No updates are to be performed."),
            SubmitErrorKind::Other
        );
        assert_eq!(classify(None, "dispatch failure"), SubmitErrorKind::Other);
    }

    #[test]
    fn test_classify_known_codes() {
        assert_eq!(
            classify(Some("AlreadyExistsException"), "Stack [demo-stack] already exists"),
            SubmitErrorKind::AlreadyExists
        );
        assert_eq!(
            classify(Some("AccessDenied"), "not authorized"),
            SubmitErrorKind::AccessDenied
        );
    }

    #[test]
    fn test_sdk_request_shape() {
        let params: ParameterSet = [("Env", "dev"), ("Bucket", "logs")].into_iter().collect();
        let request = StackRequest {
            stack_name: String::from("demo-stack"),
            template_body: TemplateBody::from("Resources: {}"),
            parameters: params.to_stack_parameters(),
            capabilities: vec![Capability::Iam],
            client_request_token: String::from("token"),
        };

        let sdk_params = CloudFormationBackend::to_sdk_parameters(&request);
        assert_eq!(sdk_params.len(), 2);
        assert_eq!(sdk_params[0].parameter_key(), Some("Bucket"));
        assert_eq!(sdk_params[1].parameter_value(), Some("dev"));

        let caps = CloudFormationBackend::to_sdk_capabilities(&request);
        assert_eq!(caps, vec![CfnCapability::CapabilityIam]);
        assert_eq!(caps[0].as_str(), Capability::Iam.as_str());
    }

    #[tokio::test]
    async fn test_poll_while_returns_once_status_moves_on() {
        let mut statuses = vec![
            Some(StatusCode::ImportRollbackComplete),
            Some(StatusCode::ImportRollbackInProgress),
            Some(StatusCode::ImportRollbackInProgress),
        ];
        let mut polls = 0;

        let result = poll_while(
            || {
                polls += 1;
                let next = statuses.pop().flatten();
                async move { Ok(next) }
            },
            &StatusCode::ImportRollbackInProgress,
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(polls, 3);
    }

    #[tokio::test]
    async fn test_poll_while_gives_up_after_max_wait() {
        let result = poll_while(
            || async { Ok(Some(StatusCode::ImportRollbackInProgress)) },
            &StatusCode::ImportRollbackInProgress,
            Duration::from_millis(5),
            Duration::from_millis(12),
        )
        .await;

        let message = result.expect_err("still rolling back");
        assert!(message.contains("IMPORT_ROLLBACK_IN_PROGRESS"));
    }

    #[tokio::test]
    async fn test_poll_while_reports_describe_failure() {
        let result = poll_while(
            || async {
                Err(StackError::DescribeFailed {
                    stack: String::from("demo-stack"),
                    message: String::from("throttled"),
                })
            },
            &StatusCode::ImportRollbackInProgress,
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
        .await;

        assert!(result.expect_err("describe failed").contains("throttled"));
    }
}
