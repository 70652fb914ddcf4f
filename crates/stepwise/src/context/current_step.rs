//! The "current step" property and the free-standing comment helper.

use std::sync::Mutex;

use super::{ContextProperty, ScenarioContext};
use crate::error::ContextError;
use crate::pipeline::StepHandle;
use crate::sync::lock;

/// Step currently in flight within the active scenario.
///
/// Bound by [`StepCommentingExtension`](crate::StepCommentingExtension)
/// around each step body.
#[derive(Debug, Default)]
pub struct CurrentStep {
    step: Mutex<Option<StepHandle>>,
}

impl ContextProperty for CurrentStep {}

impl CurrentStep {
    /// Bind `step` as current, returning the previously bound step.
    pub fn replace(&self, step: Option<StepHandle>) -> Option<StepHandle> {
        std::mem::replace(&mut *lock(&self.step), step)
    }

    /// Handle of the step in flight, if one is bound.
    #[must_use]
    pub fn get(&self) -> Option<StepHandle> {
        lock(&self.step).clone()
    }
}

/// Append a comment to the step currently running in this flow.
///
/// Requires step commenting to be enabled in the engine configuration.
///
/// # Errors
///
/// Returns [`ContextError::NoActiveScenario`] outside a scenario,
/// [`ContextError::NoCurrentStep`] when no step is bound, and
/// [`ContextError::StepSealed`] when the bound step has already finished.
pub fn comment(text: impl Into<String>) -> Result<(), ContextError> {
    let step = ScenarioContext::property::<CurrentStep>()?
        .get()
        .ok_or(ContextError::NoCurrentStep)?;
    step.comment(text)
}
