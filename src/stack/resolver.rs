//! Status resolver.
//!
//! Reads a stack's status and, while an operation is in flight, waits on the
//! backend's native waiter for that operation family before reading again.
//! The result is always a terminal status or [`StackStatus::Absent`].

use crate::config::WaitConfig;
use crate::error::StackError;

use super::backend::{StackBackend, Waiter};
use super::events::{StackEvent, StackObserver, TracingObserver};
use super::status::{Phase, StackStatus, StatusCode, Transition};

/// Resolves a stack to a settled status.
pub struct StatusResolver<'a, B: StackBackend + ?Sized> {
    /// Provisioning backend.
    backend: &'a B,
    /// Event sink.
    observer: &'a dyn StackObserver,
    /// Maximum number of waits before giving up on a stack that keeps moving.
    max_rounds: u32,
}

impl<'a, B: StackBackend + ?Sized> StatusResolver<'a, B> {
    /// Creates a resolver that reports to `tracing`.
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

    /// Sets the maximum number of wait rounds (at least one).
    #[must_use]
    pub const fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = if max_rounds == 0 { 1 } else { max_rounds };
        self
    }

    /// Waits for the stack to arrive in a final status.
    ///
    /// A failed describe is reported as an event and treated as an absent
    /// stack. A waiter failure is only an error when the stack is still in
    /// flight afterwards in the operation family that waiter covers.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::WaitObservationFailed`] if a waiter fails and the
    /// stack has not settled, or [`StackError::StillTransitional`] if the stack
    /// is still in flight after the configured number of waits.
    pub async fn resolve(&self, stack_name: &str) -> Result<StackStatus, StackError> {
        let mut current = self.observe(stack_name).await;
        let mut rounds = 0;

        loop {
            let Some(code) = current else {
                self.observer.on_event(&StackEvent::Absent {
                    stack: stack_name.to_string(),
                });
                return Ok(StackStatus::Absent);
            };

            let Phase::Transitional(transition) = code.phase() else {
                if let StatusCode::Unrecognized(raw) = &code {
                    self.observer.on_event(&StackEvent::UnrecognizedStatus {
                        stack: stack_name.to_string(),
                        status: raw.clone(),
                    });
                }
                self.observer.on_event(&StackEvent::Resolved {
                    stack: stack_name.to_string(),
                    status: code.clone(),
                });
                return Ok(StackStatus::Terminal(code));
            };

            if rounds >= self.max_rounds {
                return Err(StackError::StillTransitional {
                    stack: stack_name.to_string(),
                    status: code.to_string(),
                    rounds,
                });
            }
            rounds += 1;

            let waiter = waiter_for(transition);
            self.observer.on_event(&StackEvent::WaitStarted {
                stack: stack_name.to_string(),
                status: code,
                transition,
                waiter,
            });

            let waited = self.backend.wait(stack_name, waiter).await;
            if let Err(err) = &waited {
                self.observer.on_event(&StackEvent::WaitFailed {
                    stack: stack_name.to_string(),
                    waiter,
                    message: err.to_string(),
                });
            }

            current = self.observe(stack_name).await;

            // A waiter may fail because the stack moved into another
            // operation family; that family gets its own round.
            if let (Err(err), Some(still)) = (waited, &current)
                && let Phase::Transitional(next) = still.phase()
                && waiter_for(next) == waiter
            {
                return Err(StackError::WaitObservationFailed {
                    stack: stack_name.to_string(),
                    waiter: waiter.to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    /// Reads the current status, folding describe failures into absence.
    async fn observe(&self, stack_name: &str) -> Option<StatusCode> {
        match self.backend.describe_stack(stack_name).await {
            Ok(Some(status)) => {
                self.observer.on_event(&StackEvent::StatusObserved {
                    stack: stack_name.to_string(),
                    status: status.clone(),
                });
                Some(status)
            }
            Ok(None) => None,
            Err(err) => {
                self.observer.on_event(&StackEvent::DescribeFailed {
                    stack: stack_name.to_string(),
                    message: err.to_string(),
                });
                None
            }
        }
    }
}

/// Chooses the waiter that settles an operation family.
const fn waiter_for(transition: Transition) -> Waiter {
    match transition {
        Transition::Create => Waiter::CreateComplete,
        Transition::Update => Waiter::UpdateComplete,
        Transition::Delete => Waiter::DeleteComplete,
        Transition::Import => Waiter::ImportComplete,
        Transition::ImportRollback => Waiter::ImportRollbackComplete,
    }
}
