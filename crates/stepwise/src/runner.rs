//! Entry points a host test framework calls.
//!
//! A [`FeatureRunner`] stands for one host test class. It hands out a
//! [`ScenarioRunner`] per test method; scenario runners may execute
//! concurrently on any threads. Once every scenario has completed,
//! [`FeatureRunner::finish`] submits the feature to the coordinator.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::coordinator::FeatureCoordinator;
use crate::error::CoordinatorError;
use crate::pipeline::{Pipeline, ScenarioDefinition};
use crate::result::{FeatureInfo, FeatureResult, ScenarioResult};
use crate::sync::lock;

#[derive(Default)]
struct FeatureProgress {
    finished: bool,
    in_flight: usize,
    scenarios: Vec<ScenarioResult>,
}

struct FeatureShared {
    info: FeatureInfo,
    pipeline: Arc<Pipeline>,
    coordinator: Arc<FeatureCoordinator>,
    progress: Mutex<FeatureProgress>,
}

/// Cloneable handle for running the scenarios of one feature.
#[derive(Clone)]
pub struct FeatureRunner {
    shared: Arc<FeatureShared>,
}

impl FeatureRunner {
    pub(crate) fn new(
        info: FeatureInfo,
        pipeline: Arc<Pipeline>,
        coordinator: Arc<FeatureCoordinator>,
    ) -> Self {
        Self {
            shared: Arc::new(FeatureShared {
                info,
                pipeline,
                coordinator,
                progress: Mutex::new(FeatureProgress::default()),
            }),
        }
    }

    /// Feature identity.
    #[must_use]
    pub fn info(&self) -> &FeatureInfo {
        &self.shared.info
    }

    /// Prepare a scenario of this feature for execution.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::FeatureFinished`] once the feature has
    /// been finished and [`CoordinatorError::Disposed`] once the coordinator
    /// has been disposed.
    pub fn new_scenario(
        &self,
        definition: ScenarioDefinition,
    ) -> Result<ScenarioRunner, CoordinatorError> {
        self.shared.coordinator.ensure_running()?;
        let mut progress = lock(&self.shared.progress);
        if progress.finished {
            return Err(CoordinatorError::FeatureFinished {
                feature: self.shared.info.name().to_owned(),
            });
        }
        progress.in_flight += 1;
        Ok(ScenarioRunner {
            definition,
            in_flight: InFlight {
                shared: Arc::clone(&self.shared),
            },
        })
    }

    /// Snapshot of the feature with the scenarios completed so far.
    #[must_use]
    pub fn feature_result(&self) -> FeatureResult {
        let scenarios = lock(&self.shared.progress).scenarios.clone();
        FeatureResult::new(self.shared.info.clone(), scenarios)
    }

    /// Seal the feature, notify `feature_finish`, and submit it to the
    /// coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::ScenariosInFlight`] while created
    /// scenarios have not completed, [`CoordinatorError::FeatureFinished`]
    /// on a second call, and the coordinator's error when it is not
    /// running.
    pub fn finish(&self) -> Result<FeatureResult, CoordinatorError> {
        let feature = {
            let mut progress = lock(&self.shared.progress);
            if progress.finished {
                return Err(CoordinatorError::FeatureFinished {
                    feature: self.shared.info.name().to_owned(),
                });
            }
            if progress.in_flight > 0 {
                return Err(CoordinatorError::ScenariosInFlight {
                    feature: self.shared.info.name().to_owned(),
                    pending: progress.in_flight,
                });
            }
            progress.finished = true;
            FeatureResult::new(self.shared.info.clone(), progress.scenarios.clone())
        };
        self.shared.pipeline.notifier().feature_finish(&feature);
        self.shared.coordinator.add_feature(feature.clone())?;
        Ok(feature)
    }
}

impl fmt::Debug for FeatureRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRunner")
            .field("feature", &self.shared.info.name())
            .finish_non_exhaustive()
    }
}

/// Marks a scenario as in flight until it completes or is dropped.
struct InFlight {
    shared: Arc<FeatureShared>,
}

impl InFlight {
    fn complete(self, result: ScenarioResult) {
        lock(&self.shared.progress).scenarios.push(result);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut progress = lock(&self.shared.progress);
        progress.in_flight = progress.in_flight.saturating_sub(1);
    }
}

/// One scenario ready to run.
///
/// Dropping a runner without running it releases its in-flight slot and
/// records nothing.
pub struct ScenarioRunner {
    definition: ScenarioDefinition,
    in_flight: InFlight,
}

impl ScenarioRunner {
    /// Scenario definition about to run.
    #[must_use]
    pub const fn definition(&self) -> &ScenarioDefinition {
        &self.definition
    }

    /// Execute the scenario on the caller's runtime.
    ///
    /// The returned future is `Send` and may be spawned on a multi-thread
    /// runtime.
    pub async fn run_async(self) -> ScenarioResult {
        let Self {
            definition,
            in_flight,
        } = self;
        let shared = Arc::clone(&in_flight.shared);
        let result = shared.pipeline.execute(&shared.info, definition).await;
        in_flight.complete(result.clone());
        result
    }

    /// Execute the scenario to completion on a fresh current-thread Tokio
    /// runtime, blocking the calling thread.
    ///
    /// Must not be called from within a Tokio runtime; use
    /// [`run_async`](Self::run_async) there.
    ///
    /// # Errors
    ///
    /// Returns an error, without running the scenario, when called from
    /// within a Tokio runtime, and when the runtime cannot be built.
    pub fn run(self) -> std::io::Result<ScenarioResult> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(std::io::Error::other(format!(
                "scenario '{}' cannot block inside a Tokio runtime; use run_async",
                self.definition.info().name()
            )));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.run_async()))
    }
}

impl fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("feature", &self.in_flight.shared.info.name())
            .field("scenario", &self.definition.info().name())
            .finish()
    }
}
