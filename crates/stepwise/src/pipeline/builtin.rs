//! Extensions supplied by the engine itself.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::extension::{ExtensionError, ScenarioExtension, ScenarioNext, StepExtension, StepNext};
use super::handle::{ScenarioHandle, StepHandle};
use crate::context::{CurrentStep, ScenarioContext};
use crate::error::StepError;

/// Installs a fresh [`ScenarioContext`] for the scenario and clears it when
/// the scenario finishes, however it finishes.
///
/// Always the outermost scenario extension.
#[derive(Debug, Default)]
pub(crate) struct ScenarioContextExtension;

struct ClearContext;

impl Drop for ClearContext {
    fn drop(&mut self) {
        if ScenarioContext::set_current(None).is_err() {
            log::debug!("scenario context dropped outside its flow scope");
        }
    }
}

impl ScenarioExtension for ScenarioContextExtension {
    fn around<'a>(
        &'a self,
        scenario: &'a ScenarioHandle,
        next: ScenarioNext<'a>,
    ) -> BoxFuture<'a, Result<(), ExtensionError>> {
        Box::pin(async move {
            let context = ScenarioContext::new(scenario.feature().clone(), scenario.info().clone());
            ScenarioContext::set_current(Some(Arc::new(context)))?;
            let _clear = ClearContext;
            next.run().await
        })
    }
}

/// Binds the running step as [`CurrentStep`] so that
/// [`comment`](crate::comment) can reach it.
///
/// Enabled with
/// [`EngineConfiguration::enable_step_commenting`](crate::EngineConfiguration::enable_step_commenting).
#[derive(Debug, Default)]
pub struct StepCommentingExtension;

struct RestoreStep {
    current: Arc<CurrentStep>,
    previous: Option<StepHandle>,
}

impl Drop for RestoreStep {
    fn drop(&mut self) {
        self.current.replace(self.previous.take());
    }
}

impl StepExtension for StepCommentingExtension {
    fn around<'a>(
        &'a self,
        step: &'a StepHandle,
        next: StepNext<'a>,
    ) -> BoxFuture<'a, Result<(), StepError>> {
        Box::pin(async move {
            let current = ScenarioContext::property::<CurrentStep>()?;
            let previous = current.replace(Some(step.clone()));
            let _restore = RestoreStep { current, previous };
            next.run().await
        })
    }
}
