//! Execution pipeline: composed extension chains around every step and
//! scenario invocation.
//!
//! For each scenario the pipeline opens a flow scope, notifies
//! `scenario_start`, and runs the scenario chain. The innermost link runs
//! the steps in declaration order; each step goes through the step chain,
//! its outcome is classified, and the step is sealed. A step classified as
//! `Failed` or `Ignored` halts the scenario, leaving the remaining steps
//! `NotRun`. Panics anywhere in the chains are caught and recorded.

mod builtin;
mod definition;
mod extension;
mod handle;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use futures_util::FutureExt;

pub use builtin::StepCommentingExtension;
pub(crate) use builtin::ScenarioContextExtension;
pub use definition::{ScenarioDefinition, StepDefinition, StepFuture};
pub(crate) use definition::StepBody;
pub use extension::{ExtensionError, ScenarioExtension, ScenarioNext, StepExtension, StepNext};
pub use handle::{ScenarioHandle, StepHandle};

use crate::classify::{Classification, FailureClassifier};
use crate::context::ScenarioContext;
use crate::error::{PanicPayload, StepError};
use crate::notify::ProgressNotifier;
use crate::panic::panic_message;
use crate::result::{ExecutionTime, FeatureInfo, ScenarioResult, StepInfo};

/// Extension chains, classifier, and notifier shared by every scenario of a
/// run.
pub(crate) struct Pipeline {
    step_extensions: Arc<[Arc<dyn StepExtension>]>,
    scenario_extensions: Arc<[Arc<dyn ScenarioExtension>]>,
    classifier: Arc<dyn FailureClassifier>,
    notifier: Arc<dyn ProgressNotifier>,
}

impl Pipeline {
    /// Compose the chains once. The context extension is placed outermost.
    pub(crate) fn new(
        step_extensions: Vec<Arc<dyn StepExtension>>,
        scenario_extensions: Vec<Arc<dyn ScenarioExtension>>,
        classifier: Arc<dyn FailureClassifier>,
        notifier: Arc<dyn ProgressNotifier>,
    ) -> Self {
        let context: Arc<dyn ScenarioExtension> = Arc::new(ScenarioContextExtension);
        let scenario_extensions = std::iter::once(context)
            .chain(scenario_extensions)
            .collect();
        Self {
            step_extensions: step_extensions.into(),
            scenario_extensions,
            classifier,
            notifier,
        }
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn ProgressNotifier> {
        &self.notifier
    }

    /// Run one scenario of `feature` to completion.
    pub(crate) async fn execute(
        &self,
        feature: &FeatureInfo,
        definition: ScenarioDefinition,
    ) -> ScenarioResult {
        ScenarioContext::flow(self.execute_in_flow(feature, definition)).await
    }

    async fn execute_in_flow(
        &self,
        feature: &FeatureInfo,
        definition: ScenarioDefinition,
    ) -> ScenarioResult {
        let (info, steps) = definition.into_parts();
        let total = steps.len();
        let (handles, bodies): (Vec<_>, Vec<_>) = steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| {
                let (keyword, name, body) = step.into_parts();
                let info = StepInfo::new(index + 1, total, keyword, name);
                (StepHandle::new(info, Arc::clone(&self.notifier)), body)
            })
            .unzip();
        let scenario = ScenarioHandle::new(feature.clone(), info, handles);

        log::debug!("scenario '{}' of '{}' started", scenario.info(), feature.name());
        self.notifier.scenario_start(scenario.info());
        let started = SystemTime::now();
        let clock = Instant::now();

        let steps = self.run_steps(&scenario, bodies).boxed();
        let next = ScenarioNext::new(&self.scenario_extensions, &scenario, steps);
        let outcome = AssertUnwindSafe(async move { next.run().await })
            .catch_unwind()
            .await;
        let defect = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(error.to_string()),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };
        if let Some(message) = &defect {
            log::error!("scenario '{}' extension defect: {message}", scenario.info());
        }

        let result = scenario.finish(defect, ExecutionTime::new(started, clock.elapsed()));
        log::debug!("scenario '{}' finished: {}", result.info(), result.status());
        self.notifier.scenario_finish(&result);
        result
    }

    async fn run_steps(&self, scenario: &ScenarioHandle, bodies: Vec<StepBody>) {
        for (step, body) in scenario.steps().iter().zip(bodies) {
            step.start();
            self.notifier.step_start(step.info());
            let next = StepNext::new(&self.step_extensions, step, body);
            let outcome = AssertUnwindSafe(async move { next.run().await })
                .catch_unwind()
                .await;
            let classification = match outcome {
                Ok(Ok(())) => Classification::passed(),
                Ok(Err(error)) => self.classifier.classify(error),
                Err(payload) => self
                    .classifier
                    .classify(StepError::Panicked(PanicPayload::new(payload))),
            };
            let status = classification.status();
            let result = step.seal(classification);
            self.notifier.step_finish(&result);
            if status.halts_scenario() {
                log::debug!("step '{}' ended with {status}; skipping the rest", step.info());
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests;
