//! Upsert coordinator.
//!
//! Drives a stack towards a template and parameter set with a single create
//! or update submission, chosen from the settled status of the stack.

use serde::Serialize;
use std::fmt;
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::config::WaitConfig;
use crate::error::{Result, StackError, StackOperation};

use super::backend::{Capability, StackBackend, StackRequest, Waiter};
use super::events::{StackEvent, StackObserver, TracingObserver};
use super::params::ParameterSet;
use super::resolver::StatusResolver;
use super::status::{StackStatus, StatusCode};
use super::template::TemplateBody;

/// Capabilities acknowledged on every submission.
const CAPABILITIES: &[Capability] = &[Capability::Iam];

/// How an upsert succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// The stack did not exist and a create was accepted.
    Created,
    /// An update was accepted. Completion is not awaited.
    Updated,
    /// The stack already matched the template and parameters.
    Unchanged,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Creates or updates a stack.
pub struct StackUpserter<'a, B: StackBackend + ?Sized> {
    /// Provisioning backend.
    backend: &'a B,
    /// Event sink.
    observer: &'a dyn StackObserver,
    /// Maximum resolver wait rounds.
    max_rounds: u32,
}

impl<'a, B: StackBackend + ?Sized> StackUpserter<'a, B> {
    /// Creates an upserter that reports to `tracing`.
    #[must_use]
    pub const fn new(backend: &'a B) -> Self {
        Self {
            backend,
            observer: &TracingObserver,
            max_rounds: WaitConfig::DEFAULT_MAX_ROUNDS,
        }
    }

    /// Sets the event observer.
    #[must_use]
    pub const fn with_observer(mut self, observer: &'a dyn StackObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Sets the maximum number of resolver wait rounds.
    #[must_use]
    pub const fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Returns a status resolver sharing this upserter's backend and observer.
    #[must_use]
    pub const fn resolver(&self) -> StatusResolver<'a, B> {
        StatusResolver::new(self.backend)
            .with_observer(self.observer)
            .with_max_rounds(self.max_rounds)
    }

    /// Creates or updates `stack_name` from a template and parameters.
    ///
    /// An update the backend rejects because nothing changed is a success
    /// ([`UpsertOutcome::Unchanged`]). Creates wait until the stack is
    /// queryable; updates return as soon as the backend accepts them.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving the current status fails, if the
    /// submission is rejected for any other reason, or if the stack never
    /// becomes queryable after a create.
    pub async fn upsert(
        &self,
        stack_name: &str,
        template: impl Into<TemplateBody>,
        parameters: &ParameterSet,
    ) -> Result<UpsertOutcome> {
        let status = self.resolver().resolve(stack_name).await?;
        self.submit(stack_name, status, template.into(), parameters)
            .await
    }

    /// Like [`upsert`](Self::upsert), draining the template from a stream
    /// after the current status has been resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the template fails, or for any reason
    /// [`upsert`](Self::upsert) fails.
    pub async fn upsert_reader<R>(
        &self,
        stack_name: &str,
        template: &mut R,
        parameters: &ParameterSet,
    ) -> Result<UpsertOutcome>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let status = self.resolver().resolve(stack_name).await?;
        let template = TemplateBody::read_from(template).await?;
        self.submit(stack_name, status, template, parameters).await
    }

    async fn submit(
        &self,
        stack_name: &str,
        status: StackStatus,
        template_body: TemplateBody,
        parameters: &ParameterSet,
    ) -> Result<UpsertOutcome> {
        let request = StackRequest {
            stack_name: stack_name.to_string(),
            template_body,
            parameters: parameters.to_stack_parameters(),
            capabilities: CAPABILITIES.to_vec(),
            client_request_token: Uuid::new_v4().to_string(),
        };

        match status {
            StackStatus::Absent => self.create(&request).await,
            StackStatus::Terminal(prior) => self.update(&request, prior).await,
        }
    }

    async fn create(&self, request: &StackRequest) -> Result<UpsertOutcome> {
        let stack = &request.stack_name;
        self.observer.on_event(&StackEvent::Creating {
            stack: stack.clone(),
            parameters: describe_parameters(request),
            template_digest: request.template_body.short_digest(),
            request_token: request.client_request_token.clone(),
        });

        if let Err(source) = self.backend.create_stack(request).await {
            self.observer.on_event(&StackEvent::SubmissionRejected {
                stack: stack.clone(),
                code: source.code.clone(),
                message: source.message.clone(),
            });
            return Err(StackError::SubmissionFailed {
                stack: stack.clone(),
                operation: StackOperation::Create,
                source,
            }
            .into());
        }

        if let Err(err) = self.backend.wait(stack, Waiter::Exists).await {
            self.observer.on_event(&StackEvent::WaitFailed {
                stack: stack.clone(),
                waiter: Waiter::Exists,
                message: err.to_string(),
            });
            return Err(StackError::WaitObservationFailed {
                stack: stack.clone(),
                waiter: Waiter::Exists.to_string(),
                message: err.to_string(),
            }
            .into());
        }

        self.observer.on_event(&StackEvent::Created {
            stack: stack.clone(),
        });
        Ok(UpsertOutcome::Created)
    }

    async fn update(&self, request: &StackRequest, prior: StatusCode) -> Result<UpsertOutcome> {
        let stack = &request.stack_name;
        self.observer.on_event(&StackEvent::Updating {
            stack: stack.clone(),
            prior_status: prior,
            parameters: describe_parameters(request),
            template_digest: request.template_body.short_digest(),
            request_token: request.client_request_token.clone(),
        });

        match self.backend.update_stack(request).await {
            Ok(()) => {
                self.observer.on_event(&StackEvent::UpdateSubmitted {
                    stack: stack.clone(),
                });
                Ok(UpsertOutcome::Updated)
            }
            Err(source) if source.is_no_updates() => {
                self.observer.on_event(&StackEvent::NoChanges {
                    stack: stack.clone(),
                });
                Ok(UpsertOutcome::Unchanged)
            }
            Err(source) => {
                self.observer.on_event(&StackEvent::SubmissionRejected {
                    stack: stack.clone(),
                    code: source.code.clone(),
                    message: source.message.clone(),
                });
                Err(StackError::SubmissionFailed {
                    stack: stack.clone(),
                    operation: StackOperation::Update,
                    source,
                }
                .into())
            }
        }
    }
}

fn describe_parameters(request: &StackRequest) -> Vec<String> {
    request.parameters.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StackformError, SubmitError, SubmitErrorKind};
    use crate::stack::backend::MockStackBackend;
    use crate::stack::events::RecordingObserver;
    use crate::stack::params::StackParameter;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn no_updates() -> SubmitError {
        SubmitError::new(
            SubmitErrorKind::NoUpdates,
            Some(String::from("ValidationError")),
            "No updates are to be performed.",
        )
    }

    fn dev_params() -> ParameterSet {
        [("Env", "dev")].into_iter().collect()
    }

    #[tokio::test]
    async fn test_absent_stack_is_created() {
        let mut backend = MockStackBackend::new();
        backend.expect_describe_stack().returning(|_| Ok(None));
        backend
            .expect_create_stack()
            .withf(|req: &StackRequest| {
                req.stack_name == "demo-stack"
                    && req.template_body.as_str() == "<template-a>"
                    && req.parameters
                        == vec![StackParameter {
                            key: String::from("Env"),
                            value: String::from("dev"),
                        }]
                    && req.capabilities == vec![Capability::Iam]
                    && !req.client_request_token.is_empty()
            })
            .times(1)
            .returning(|_| Ok(()));
        backend
            .expect_wait()
            .withf(|stack, waiter| stack == "demo-stack" && *waiter == Waiter::Exists)
            .times(1)
            .returning(|_, _| Ok(()));
        backend.expect_update_stack().never();

        let outcome = StackUpserter::new(&backend)
            .upsert("demo-stack", "<template-a>", &dev_params())
            .await
            .expect("upsert");

        assert_eq!(outcome, UpsertOutcome::Created);
    }

    #[tokio::test]
    async fn test_no_updates_is_success() {
        let mut backend = MockStackBackend::new();
        backend
            .expect_describe_stack()
            .returning(|_| Ok(Some(StatusCode::UpdateComplete)));
        backend
            .expect_update_stack()
            .times(1)
            .returning(|_| Err(no_updates()));
        backend.expect_create_stack().never();
        backend.expect_wait().never();
        let recorder = RecordingObserver::new();

        let outcome = StackUpserter::new(&backend)
            .with_observer(&recorder)
            .upsert("demo-stack", "<template-a>", &dev_params())
            .await
            .expect("upsert");

        assert_eq!(outcome, UpsertOutcome::Unchanged);
        assert!(
            recorder
                .events()
                .contains(&StackEvent::NoChanges {
                    stack: String::from("demo-stack")
                })
        );
    }

    #[tokio::test]
    async fn test_repeated_upsert_succeeds_both_times() {
        let applied = Arc::new(AtomicUsize::new(0));
        let mut backend = MockStackBackend::new();
        backend
            .expect_describe_stack()
            .returning(|_| Ok(Some(StatusCode::UpdateComplete)));
        let counter = Arc::clone(&applied);
        backend.expect_update_stack().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(())
            } else {
                Err(no_updates())
            }
        });
        backend.expect_create_stack().never();

        let upserter = StackUpserter::new(&backend);
        let first = upserter
            .upsert("demo-stack", "<template-a>", &dev_params())
            .await
            .expect("first upsert");
        let second = upserter
            .upsert("demo-stack", "<template-a>", &dev_params())
            .await
            .expect("second upsert");

        assert_eq!(first, UpsertOutcome::Updated);
        assert_eq!(second, UpsertOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_in_progress_stack_is_awaited_then_updated() {
        let describes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&describes);
        let mut backend = MockStackBackend::new();
        backend.expect_describe_stack().returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Some(StatusCode::CreateInProgress))
            } else {
                Ok(Some(StatusCode::CreateComplete))
            }
        });
        backend
            .expect_wait()
            .withf(|_, waiter| *waiter == Waiter::CreateComplete)
            .times(1)
            .returning(|_, _| Ok(()));
        backend.expect_update_stack().times(1).returning(|_| Ok(()));
        backend.expect_create_stack().never();
        let recorder = RecordingObserver::new();

        let outcome = StackUpserter::new(&backend)
            .with_observer(&recorder)
            .upsert("demo-stack", "<template-a>", &dev_params())
            .await
            .expect("upsert");

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert!(recorder.events().iter().any(|e| matches!(
            e,
            StackEvent::Updating {
                prior_status: StatusCode::CreateComplete,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_every_terminal_status_takes_update_path() {
        for raw in [
            "CREATE_COMPLETE",
            "CREATE_FAILED",
            "ROLLBACK_COMPLETE",
            "UPDATE_ROLLBACK_FAILED",
            "DELETE_FAILED",
            "IMPORT_COMPLETE",
        ] {
            let mut backend = MockStackBackend::new();
            backend
                .expect_describe_stack()
                .returning(move |_| Ok(Some(StatusCode::from_raw(raw))));
            backend.expect_update_stack().times(1).returning(|_| Ok(()));
            backend.expect_create_stack().never();

            let outcome = StackUpserter::new(&backend)
                .upsert("demo-stack", "<template-a>", &ParameterSet::new())
                .await
                .expect("upsert");

            assert_eq!(outcome, UpsertOutcome::Updated, "{raw}");
        }
    }

    #[tokio::test]
    async fn test_other_validation_error_is_returned_verbatim() {
        let mut backend = MockStackBackend::new();
        backend
            .expect_describe_stack()
            .returning(|_| Ok(Some(StatusCode::UpdateComplete)));
        backend.expect_update_stack().returning(|_| {
            Err(SubmitError::new(
                SubmitErrorKind::Validation,
                Some(String::from("ValidationError")),
                "Parameter X is required",
            ))
        });

        let err = StackUpserter::new(&backend)
            .upsert("demo-stack", "<template-a>", &dev_params())
            .await
            .expect_err("update should fail");

        let source = err.submit_error().expect("submission error");
        assert_eq!(source.kind, SubmitErrorKind::Validation);
        assert_eq!(source.code.as_deref(), Some("ValidationError"));
        assert_eq!(source.message, "Parameter X is required");
    }

    #[tokio::test]
    async fn test_create_rejection_fails_without_waiting() {
        let mut backend = MockStackBackend::new();
        backend.expect_describe_stack().returning(|_| Ok(None));
        backend.expect_create_stack().times(1).returning(|_| {
            Err(SubmitError::new(
                SubmitErrorKind::AccessDenied,
                Some(String::from("AccessDenied")),
                "User is not authorized to perform cloudformation:CreateStack",
            ))
        });
        backend.expect_wait().never();

        let err = StackUpserter::new(&backend)
            .upsert("demo-stack", "<template-a>", &dev_params())
            .await
            .expect_err("create should fail");

        assert!(matches!(
            err,
            StackformError::Stack(StackError::SubmissionFailed {
                operation: StackOperation::Create,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_exists_wait_failure_is_surfaced() {
        let mut backend = MockStackBackend::new();
        backend.expect_describe_stack().returning(|_| Ok(None));
        backend.expect_create_stack().returning(|_| Ok(()));
        backend.expect_wait().returning(|stack, waiter| {
            Err(StackError::WaitObservationFailed {
                stack: stack.to_string(),
                waiter: waiter.to_string(),
                message: String::from("exceeded max wait time"),
            })
        });

        let err = StackUpserter::new(&backend)
            .upsert("demo-stack", "<template-a>", &dev_params())
            .await
            .expect_err("wait should fail");

        assert!(matches!(
            err,
            StackformError::Stack(StackError::WaitObservationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_upsert_reader_submits_streamed_template() {
        let mut backend = MockStackBackend::new();
        backend
            .expect_describe_stack()
            .returning(|_| Ok(Some(StatusCode::UpdateComplete)));
        backend
            .expect_update_stack()
            .withf(|req: &StackRequest| req.template_body.as_str() == "Resources:\n  Bucket: {}\n")
            .times(1)
            .returning(|_| Ok(()));

        let mut stream = tokio_test::io::Builder::new()
            .read(b"Resources:\n")
            .read(b"  Bucket: {}\n")
            .build();

        let outcome = StackUpserter::new(&backend)
            .upsert_reader("demo-stack", &mut stream, &dev_params())
            .await
            .expect("upsert");

        assert_eq!(outcome, UpsertOutcome::Updated);
    }

    #[tokio::test]
    async fn test_upsert_reader_from_template_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("template.yml");
        std::fs::write(&path, "Resources: {}\n").expect("write template");

        let mut backend = MockStackBackend::new();
        backend.expect_describe_stack().returning(|_| Ok(None));
        backend
            .expect_create_stack()
            .withf(|req: &StackRequest| req.template_body.as_str() == "Resources: {}\n")
            .times(1)
            .returning(|_| Ok(()));
        backend.expect_wait().times(1).returning(|_, _| Ok(()));

        let mut file = tokio::fs::File::open(&path).await.expect("open template");
        let outcome = StackUpserter::new(&backend)
            .upsert_reader("demo-stack", &mut file, &dev_params())
            .await
            .expect("upsert");

        assert_eq!(outcome, UpsertOutcome::Created);
    }

    #[tokio::test]
    async fn test_upsert_reader_resolves_before_reading() {
        let mut backend = backend_stuck_in(StatusCode::UpdateInProgress);
        backend.expect_create_stack().never();
        backend.expect_update_stack().never();

        let mut stream = tokio_test::io::Builder::new()
            .read_error(std::io::Error::other("stream read before resolve"))
            .build();

        let err = StackUpserter::new(&backend)
            .with_max_rounds(1)
            .upsert_reader("demo-stack", &mut stream, &dev_params())
            .await
            .expect_err("still in flight");

        assert!(matches!(
            err,
            StackformError::Stack(StackError::StillTransitional { .. })
        ));
    }

    fn backend_stuck_in(status: StatusCode) -> MockStackBackend {
        let mut backend = MockStackBackend::new();
        backend
            .expect_describe_stack()
            .returning(move |_| Ok(Some(status.clone())));
        backend.expect_wait().returning(|_, _| Ok(()));
        backend
    }
}
