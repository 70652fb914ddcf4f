//! Semantic error types for the execution engine.
//!
//! [`StepError`] is what step bodies and step extensions return; the
//! classifier turns it into a status. [`ContextError`] and
//! [`CoordinatorError`] report misuse of the ambient context and of the
//! coordinator lifecycle.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::panic::panic_message;

/// Boxed error type carried by failed steps and report writers.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Failure raised by a step body or a step extension.
///
/// `Bypass` and `Ignore` are signals: they end the step without failing it.
/// Every other variant classifies as a failure.
///
/// # Examples
///
/// ```
/// use stepwise::StepError;
///
/// let error = StepError::bypass("feature flag is off");
/// assert!(error.is_signal());
/// assert_eq!(error.to_string(), "feature flag is off");
///
/// let error: StepError = std::io::Error::other("socket closed").into();
/// assert!(!error.is_signal());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StepError {
    /// The step was skipped on purpose.
    #[error("{reason}")]
    Bypass {
        /// Why the step was skipped.
        reason: String,
    },
    /// The step was inconclusive.
    #[error("{reason}")]
    Ignore {
        /// Why the step was inconclusive.
        reason: String,
    },
    /// The step failed.
    #[error("{message}")]
    Failed {
        /// Failure message recorded as the step's details.
        message: String,
        /// Underlying error, when the failure wraps one.
        source: Option<BoxError>,
    },
    /// The step panicked.
    #[error("{0}")]
    Panicked(PanicPayload),
}

impl StepError {
    /// Signal that the step was skipped on purpose.
    #[must_use]
    pub fn bypass(reason: impl Into<String>) -> Self {
        Self::Bypass {
            reason: reason.into(),
        }
    }

    /// Signal that the step was inconclusive.
    #[must_use]
    pub fn ignore(reason: impl Into<String>) -> Self {
        Self::Ignore {
            reason: reason.into(),
        }
    }

    /// Fail the step with a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// Fail the step with an underlying error, using its message.
    #[must_use]
    pub fn from_error(error: impl Into<BoxError>) -> Self {
        let source = error.into();
        Self::Failed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Whether this is a bypass or ignore signal.
    #[must_use]
    pub const fn is_signal(&self) -> bool {
        matches!(self, Self::Bypass { .. } | Self::Ignore { .. })
    }
}

impl From<BoxError> for StepError {
    fn from(error: BoxError) -> Self {
        Self::from_error(error)
    }
}

impl From<std::io::Error> for StepError {
    fn from(error: std::io::Error) -> Self {
        Self::from_error(error)
    }
}

impl From<ContextError> for StepError {
    fn from(error: ContextError) -> Self {
        Self::from_error(error)
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::failed(message)
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self::failed(message)
    }
}

/// Payload caught from a panicking step or extension.
///
/// The message is rendered when the payload is caught so the wrapper can be
/// shared across threads while the raw payload stays available for
/// downcasting.
pub struct PanicPayload {
    message: String,
    payload: Mutex<Box<dyn Any + Send>>,
}

impl PanicPayload {
    /// Wrap a caught payload.
    #[must_use]
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        Self {
            message: panic_message(payload.as_ref()),
            payload: Mutex::new(payload),
        }
    }

    /// Rendered panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Consume the wrapper, returning the raw payload.
    #[must_use]
    pub fn into_inner(self) -> Box<dyn Any + Send> {
        self.payload.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PanicPayload").field(&self.message).finish()
    }
}

impl fmt::Display for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors raised when using the ambient scenario context.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    /// No scenario is executing on the current flow.
    #[error("no scenario is executing on the current flow")]
    NoActiveScenario,
    /// The context slot was modified outside a scenario execution flow.
    #[error("the scenario context can only be set inside a scenario execution flow")]
    OutsideFlow,
    /// The running scenario has no step bound as current.
    #[error("no step is currently executing; enable step commenting to bind the current step")]
    NoCurrentStep,
    /// The step has not started yet.
    #[error("step '{step}' has not started and cannot accept comments yet")]
    StepNotStarted {
        /// Display form of the pending step.
        step: String,
    },
    /// The step has already finished.
    #[error("step '{step}' has finished and no longer accepts comments")]
    StepSealed {
        /// Display form of the finished step.
        step: String,
    },
}

/// Errors raised by the feature coordinator and feature runners.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoordinatorError {
    /// An operation ran before [`initialize`](crate::FeatureCoordinator::initialize).
    #[error("feature coordinator is not initialised")]
    NotInitialised,
    /// `initialize` ran twice.
    #[error("feature coordinator is already initialised")]
    AlreadyInitialised,
    /// An operation ran after [`dispose`](crate::FeatureCoordinator::dispose).
    #[error("feature coordinator has been disposed")]
    Disposed,
    /// The feature has already been finished and submitted.
    #[error("feature '{feature}' has already finished")]
    FeatureFinished {
        /// Feature name.
        feature: String,
    },
    /// The feature still has scenarios that have not completed.
    #[error("feature '{feature}' still has {pending} scenario(s) in flight")]
    ScenariosInFlight {
        /// Feature name.
        feature: String,
        /// Number of scenarios created but not yet completed.
        pending: usize,
    },
    /// A report writer failed during hand-off.
    #[error("report writer '{writer}' failed: {source}")]
    ReportWriter {
        /// Name of the failing writer.
        writer: String,
        /// Error returned by the writer.
        source: BoxError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_error_uses_error_message() {
        let error = StepError::from_error(std::io::Error::other("timeout"));
        assert_eq!(error.to_string(), "timeout");
        assert!(StdError::source(&error).is_some());
    }

    #[test]
    fn step_error_crosses_threads() {
        fn assert_thread_safe<T: Send + Sync + 'static>() {}
        assert_thread_safe::<StepError>();
    }

    #[test]
    fn panic_payload_renders_message() {
        let payload = PanicPayload::new(Box::new("assertion failed"));
        assert_eq!(payload.to_string(), "assertion failed");
        assert_eq!(format!("{payload:?}"), "PanicPayload(\"assertion failed\")");
    }

    #[test]
    fn coordinator_errors_display_context() {
        let error = CoordinatorError::ScenariosInFlight {
            feature: String::from("Billing"),
            pending: 2,
        };
        assert_eq!(
            error.to_string(),
            "feature 'Billing' still has 2 scenario(s) in flight"
        );
    }
}
