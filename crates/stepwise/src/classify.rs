//! Mapping of step failures onto execution statuses.
//!
//! Step bodies normally report bypass and ignore signals by returning the
//! matching [`StepError`] variant. Bodies that cannot return a value, such as
//! assertion helpers deep in a call stack, may instead unwind with a
//! [`BypassRequest`] or [`IgnoreRequest`] payload through the
//! [`bypass!`](crate::bypass!) and [`ignore!`](crate::ignore!) macros. The
//! classifier recognises both routes.

use std::any::{Any, TypeId};
use std::fmt;
use std::panic;
use std::sync::Arc;

use crate::error::{BoxError, PanicPayload, StepError};
use crate::result::FailureCause;
use crate::status::ExecutionStatus;

/// Status, details, and diagnostic cause derived from a step failure.
#[derive(Clone, Debug)]
pub struct Classification {
    status: ExecutionStatus,
    details: Option<String>,
    cause: Option<FailureCause>,
}

impl Classification {
    /// A step that completed normally.
    #[must_use]
    pub const fn passed() -> Self {
        Self {
            status: ExecutionStatus::Passed,
            details: None,
            cause: None,
        }
    }

    /// A step skipped on purpose.
    #[must_use]
    pub fn bypassed(reason: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Bypassed,
            details: Some(reason.into()),
            cause: None,
        }
    }

    /// An inconclusive step.
    #[must_use]
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Ignored,
            details: Some(reason.into()),
            cause: None,
        }
    }

    /// A failed step with its preserved cause.
    #[must_use]
    pub fn failed(cause: FailureCause) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            details: Some(cause.message().to_owned()),
            cause: Some(cause),
        }
    }

    /// Resulting status.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Reason or failure message.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Preserved failure, present only for failed steps.
    #[must_use]
    pub const fn cause(&self) -> Option<&FailureCause> {
        self.cause.as_ref()
    }

    pub(crate) fn into_parts(self) -> (ExecutionStatus, Option<String>, Option<FailureCause>) {
        (self.status, self.details, self.cause)
    }
}

/// Maps a step failure onto a status.
pub trait FailureClassifier: Send + Sync {
    /// Classify a failure raised by a step body or a step extension.
    fn classify(&self, error: StepError) -> Classification;
}

/// Panic payload requesting that the current step be bypassed.
#[derive(Debug)]
pub struct BypassRequest {
    reason: String,
}

impl BypassRequest {
    /// Reason supplied by the step.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Unwind with a bypass request.
    #[track_caller]
    pub fn raise(reason: impl Into<String>) -> ! {
        panic::resume_unwind(Box::new(Self {
            reason: reason.into(),
        }));
    }
}

/// Panic payload marking the current step as inconclusive.
#[derive(Debug)]
pub struct IgnoreRequest {
    reason: String,
}

impl IgnoreRequest {
    /// Reason supplied by the step.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Unwind with an ignore request.
    #[track_caller]
    pub fn raise(reason: impl Into<String>) -> ! {
        panic::resume_unwind(Box::new(Self {
            reason: reason.into(),
        }));
    }
}

type Detector = fn(&(dyn Any + Send)) -> Option<String>;

fn render<T: Any + fmt::Display>(payload: &(dyn Any + Send)) -> Option<String> {
    payload.downcast_ref::<T>().map(ToString::to_string)
}

/// Classifier applying the built-in bypass, ignore, and failure rules.
///
/// Host adapters whose assertion helpers panic with their own "inconclusive"
/// payload can register it with [`with_ignore_payload`](Self::with_ignore_payload).
///
/// # Examples
///
/// ```
/// use stepwise::{DefaultClassifier, ExecutionStatus, FailureClassifier, StepError};
///
/// let classifier = DefaultClassifier::new();
/// let outcome = classifier.classify(StepError::bypass("not on this platform"));
/// assert_eq!(outcome.status(), ExecutionStatus::Bypassed);
/// assert_eq!(outcome.details(), Some("not on this platform"));
///
/// let outcome = classifier.classify(StepError::failed("balance mismatch"));
/// assert_eq!(outcome.status(), ExecutionStatus::Failed);
/// assert!(outcome.cause().is_some());
/// ```
#[derive(Clone, Default)]
pub struct DefaultClassifier {
    ignore_detectors: Vec<(TypeId, Detector)>,
}

impl DefaultClassifier {
    /// Create a classifier with only the built-in rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat panics carrying a `T` payload as inconclusive, using its
    /// `Display` output as the details.
    #[must_use]
    pub fn with_ignore_payload<T: Any + fmt::Display>(mut self) -> Self {
        let id = TypeId::of::<T>();
        if !self.ignore_detectors.iter().any(|(known, _)| *known == id) {
            self.ignore_detectors.push((id, render::<T>));
        }
        self
    }

    fn classify_failed(message: String, source: Option<BoxError>) -> Classification {
        let Some(source) = source else {
            return Classification::failed(FailureCause::new(message, None));
        };
        source.downcast::<StepError>().map_or_else(
            |source| Classification::failed(FailureCause::new(message, Some(Arc::from(source)))),
            |inner| Self::classify_unwrapped(*inner),
        )
    }

    fn classify_panic(&self, payload: PanicPayload) -> Classification {
        let message = payload.message().to_owned();
        let payload = payload.into_inner();
        if let Some(request) = payload.downcast_ref::<BypassRequest>() {
            return Classification::bypassed(request.reason());
        }
        if let Some(request) = payload.downcast_ref::<IgnoreRequest>() {
            return Classification::ignored(request.reason());
        }
        if let Some(reason) = self
            .ignore_detectors
            .iter()
            .find_map(|(_, detect)| detect(payload.as_ref()))
        {
            return Classification::ignored(reason);
        }
        payload.downcast::<StepError>().map_or_else(
            |_| Classification::failed(FailureCause::new(message, None)),
            |inner| Self::classify_unwrapped(*inner),
        )
    }

    /// Classify a value found one level inside a wrapper without unwrapping
    /// any further.
    fn classify_unwrapped(error: StepError) -> Classification {
        match error {
            StepError::Bypass { reason } => Classification::bypassed(reason),
            StepError::Ignore { reason } => Classification::ignored(reason),
            StepError::Failed { message, source } => {
                Classification::failed(FailureCause::new(message, source.map(Arc::from)))
            }
            StepError::Panicked(payload) => {
                Classification::failed(FailureCause::new(payload.message(), None))
            }
        }
    }
}

impl fmt::Debug for DefaultClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultClassifier")
            .field("ignore_detectors", &self.ignore_detectors.len())
            .finish()
    }
}

impl FailureClassifier for DefaultClassifier {
    fn classify(&self, error: StepError) -> Classification {
        match error {
            StepError::Bypass { reason } => Classification::bypassed(reason),
            StepError::Ignore { reason } => Classification::ignored(reason),
            StepError::Failed { message, source } => Self::classify_failed(message, source),
            StepError::Panicked(payload) => self.classify_panic(payload),
        }
    }
}
