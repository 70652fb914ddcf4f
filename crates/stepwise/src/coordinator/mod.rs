//! Process-scoped collector of finished features.
//!
//! The coordinator is constructed explicitly and shared through an `Arc`.
//! Its lifecycle is `initialize`, then any number of feature runners and
//! concurrent [`add_feature`](FeatureCoordinator::add_feature) calls, then a
//! single `dispose` that hands the aggregate to the report writers.

mod aggregator;

use std::sync::{Arc, Mutex};

pub use aggregator::{CollectingAggregator, FeatureAggregator, MergingAggregator, ReportWriter};

use crate::config::EngineConfiguration;
use crate::error::CoordinatorError;
use crate::pipeline::Pipeline;
use crate::result::{FeatureInfo, FeatureResult};
use crate::runner::FeatureRunner;
use crate::sync::lock;

struct Running {
    pipeline: Arc<Pipeline>,
    aggregator: Box<dyn FeatureAggregator>,
    writers: Vec<Arc<dyn ReportWriter>>,
}

enum CoordinatorState {
    Uninitialised,
    Running(Running),
    Disposed,
}

/// Collects feature results from concurrently running scenarios.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use stepwise::{CoordinatorError, EngineConfiguration, FeatureCoordinator, FeatureInfo};
///
/// let coordinator = Arc::new(FeatureCoordinator::new());
/// assert!(matches!(
///     coordinator.feature_runner(FeatureInfo::new("Early")),
///     Err(CoordinatorError::NotInitialised)
/// ));
/// coordinator
///     .initialize(EngineConfiguration::default())
///     .expect("first initialisation");
/// assert!(coordinator.is_initialized());
/// let features = coordinator.dispose().expect("running coordinator");
/// assert!(features.is_empty());
/// assert!(matches!(coordinator.dispose(), Err(CoordinatorError::Disposed)));
/// ```
pub struct FeatureCoordinator {
    state: Mutex<CoordinatorState>,
}

impl Default for FeatureCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureCoordinator {
    /// Create an uninitialised coordinator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(CoordinatorState::Uninitialised),
        }
    }

    /// Compose the pipeline from `config` and open the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::AlreadyInitialised`] on a second call and
    /// [`CoordinatorError::Disposed`] after disposal.
    pub fn initialize(&self, config: EngineConfiguration) -> Result<(), CoordinatorError> {
        let mut state = lock(&self.state);
        match *state {
            CoordinatorState::Uninitialised => {}
            CoordinatorState::Running(_) => return Err(CoordinatorError::AlreadyInitialised),
            CoordinatorState::Disposed => return Err(CoordinatorError::Disposed),
        }
        let (pipeline, aggregator, writers) = config.build();
        *state = CoordinatorState::Running(Running {
            pipeline: Arc::new(pipeline),
            aggregator,
            writers,
        });
        log::debug!("feature coordinator initialised");
        Ok(())
    }

    /// Whether the coordinator is between `initialize` and `dispose`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(*lock(&self.state), CoordinatorState::Running(_))
    }

    /// Fail unless the coordinator is between `initialize` and `dispose`.
    pub(crate) fn ensure_running(&self) -> Result<(), CoordinatorError> {
        self.pipeline().map(drop)
    }

    fn pipeline(&self) -> Result<Arc<Pipeline>, CoordinatorError> {
        match &*lock(&self.state) {
            CoordinatorState::Running(running) => Ok(Arc::clone(&running.pipeline)),
            CoordinatorState::Uninitialised => Err(CoordinatorError::NotInitialised),
            CoordinatorState::Disposed => Err(CoordinatorError::Disposed),
        }
    }

    /// Open a runner for one feature and notify `feature_start`.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::NotInitialised`] or
    /// [`CoordinatorError::Disposed`] outside the running window.
    pub fn feature_runner(self: &Arc<Self>, info: FeatureInfo) -> Result<FeatureRunner, CoordinatorError> {
        let pipeline = self.pipeline()?;
        pipeline.notifier().feature_start(&info);
        Ok(FeatureRunner::new(info, pipeline, Arc::clone(self)))
    }

    /// Submit a finished feature to the aggregator.
    ///
    /// Safe to call concurrently; every submitted result reaches the
    /// aggregator exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::NotInitialised`] or
    /// [`CoordinatorError::Disposed`] outside the running window.
    pub fn add_feature(&self, feature: FeatureResult) -> Result<(), CoordinatorError> {
        match &mut *lock(&self.state) {
            CoordinatorState::Running(running) => {
                log::debug!("feature '{}' submitted", feature.info().name());
                running.aggregator.aggregate(feature);
                Ok(())
            }
            CoordinatorState::Uninitialised => Err(CoordinatorError::NotInitialised),
            CoordinatorState::Disposed => Err(CoordinatorError::Disposed),
        }
    }

    /// Close the coordinator and hand the aggregate to the report writers.
    ///
    /// Notifies `run_finish`, then calls every writer in registration order
    /// even when an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::NotInitialised`] before initialisation,
    /// [`CoordinatorError::Disposed`] on a second call, and
    /// [`CoordinatorError::ReportWriter`] for the first failing writer.
    pub fn dispose(&self) -> Result<Vec<FeatureResult>, CoordinatorError> {
        let running = {
            let mut state = lock(&self.state);
            match std::mem::replace(&mut *state, CoordinatorState::Disposed) {
                CoordinatorState::Running(running) => running,
                CoordinatorState::Uninitialised => {
                    *state = CoordinatorState::Uninitialised;
                    return Err(CoordinatorError::NotInitialised);
                }
                CoordinatorState::Disposed => return Err(CoordinatorError::Disposed),
            }
        };
        let Running {
            pipeline,
            aggregator,
            writers,
        } = running;
        let features = aggregator.finish();
        pipeline.notifier().run_finish();

        let mut first_failure = None;
        for writer in &writers {
            if let Err(source) = writer.write(&features) {
                log::warn!("report writer '{}' failed: {source}", writer.name());
                if first_failure.is_none() {
                    first_failure = Some(CoordinatorError::ReportWriter {
                        writer: writer.name().to_owned(),
                        source,
                    });
                }
            }
        }
        log::debug!("feature coordinator disposed with {} feature(s)", features.len());
        first_failure.map_or(Ok(features), Err)
    }
}

impl Drop for FeatureCoordinator {
    fn drop(&mut self) {
        if matches!(*lock(&self.state), CoordinatorState::Running(_)) {
            log::warn!("feature coordinator dropped without dispose; report writers were not run");
        }
    }
}

impl std::fmt::Debug for FeatureCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match *lock(&self.state) {
            CoordinatorState::Uninitialised => "uninitialised",
            CoordinatorState::Running(_) => "running",
            CoordinatorState::Disposed => "disposed",
        };
        f.debug_struct("FeatureCoordinator")
            .field("state", &state)
            .finish()
    }
}
