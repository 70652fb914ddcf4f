//! Extension traits and the continuations that walk a composed chain.
//!
//! A chain is an ordered slice of extensions built once per configuration.
//! Each extension receives the handle of the item being executed and a
//! continuation; calling [`StepNext::run`] or [`ScenarioNext::run`] invokes
//! the next extension, ending in the real body. Extensions therefore run in
//! registration order on the way in and in reverse order on the way out.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use super::definition::StepBody;
use super::handle::{ScenarioHandle, StepHandle};
use crate::error::{BoxError, StepError};

/// Wraps each step invocation.
///
/// # Examples
///
/// ```
/// use futures_util::future::BoxFuture;
/// use stepwise::{StepError, StepExtension, StepHandle, StepNext};
///
/// struct Announce;
///
/// impl StepExtension for Announce {
///     fn around<'a>(
///         &'a self,
///         step: &'a StepHandle,
///         next: StepNext<'a>,
///     ) -> BoxFuture<'a, Result<(), StepError>> {
///         Box::pin(async move {
///             step.comment(format!("running {}", step.info().name()))?;
///             next.run().await
///         })
///     }
/// }
/// ```
pub trait StepExtension: Send + Sync {
    /// Run `next`, optionally doing work before and after it.
    ///
    /// Returning an error without calling `next` fails the step without
    /// running its body.
    fn around<'a>(
        &'a self,
        step: &'a StepHandle,
        next: StepNext<'a>,
    ) -> BoxFuture<'a, Result<(), StepError>>;
}

/// Wraps the execution of all steps of a scenario.
pub trait ScenarioExtension: Send + Sync {
    /// Run `next`, optionally doing work before and after it.
    ///
    /// An error fails the scenario with the error's message. Steps that
    /// already ran keep their results.
    fn around<'a>(
        &'a self,
        scenario: &'a ScenarioHandle,
        next: ScenarioNext<'a>,
    ) -> BoxFuture<'a, Result<(), ExtensionError>>;
}

/// Continuation of a step extension chain.
pub struct StepNext<'a> {
    remaining: &'a [Arc<dyn StepExtension>],
    step: &'a StepHandle,
    body: StepBody,
}

impl<'a> StepNext<'a> {
    pub(crate) fn new(
        chain: &'a [Arc<dyn StepExtension>],
        step: &'a StepHandle,
        body: StepBody,
    ) -> Self {
        Self {
            remaining: chain,
            step,
            body,
        }
    }

    /// Invoke the next extension, or the step body once the chain is
    /// exhausted.
    pub fn run(self) -> BoxFuture<'a, Result<(), StepError>> {
        let Some((extension, rest)) = self.remaining.split_first() else {
            return (self.body)();
        };
        extension.around(
            self.step,
            StepNext {
                remaining: rest,
                step: self.step,
                body: self.body,
            },
        )
    }
}

impl fmt::Debug for StepNext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepNext")
            .field("remaining", &self.remaining.len())
            .field("step", self.step.info())
            .finish_non_exhaustive()
    }
}

/// Continuation of a scenario extension chain.
pub struct ScenarioNext<'a> {
    remaining: &'a [Arc<dyn ScenarioExtension>],
    scenario: &'a ScenarioHandle,
    steps: BoxFuture<'a, ()>,
}

impl<'a> ScenarioNext<'a> {
    pub(crate) fn new(
        chain: &'a [Arc<dyn ScenarioExtension>],
        scenario: &'a ScenarioHandle,
        steps: BoxFuture<'a, ()>,
    ) -> Self {
        Self {
            remaining: chain,
            scenario,
            steps,
        }
    }

    /// Invoke the next extension, or run the scenario's steps once the
    /// chain is exhausted.
    pub fn run(self) -> BoxFuture<'a, Result<(), ExtensionError>> {
        let Some((extension, rest)) = self.remaining.split_first() else {
            let steps = self.steps;
            return Box::pin(async move {
                steps.await;
                Ok(())
            });
        };
        extension.around(
            self.scenario,
            ScenarioNext {
                remaining: rest,
                scenario: self.scenario,
                steps: self.steps,
            },
        )
    }
}

impl fmt::Debug for ScenarioNext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioNext")
            .field("remaining", &self.remaining.len())
            .field("scenario", self.scenario.info())
            .finish_non_exhaustive()
    }
}

/// Defect raised by a scenario extension.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExtensionError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ExtensionError {
    /// Create a defect with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, using its message.
    #[must_use]
    pub fn from_error(error: impl Into<BoxError>) -> Self {
        let source = error.into();
        Self {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Defect message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<crate::error::ContextError> for ExtensionError {
    fn from(error: crate::error::ContextError) -> Self {
        Self::from_error(error)
    }
}
