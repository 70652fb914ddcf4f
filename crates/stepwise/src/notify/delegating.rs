//! Ordered fan-out over several notifiers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::ProgressNotifier;
use crate::panic::panic_message;
use crate::result::{FeatureInfo, FeatureResult, ScenarioInfo, ScenarioResult, StepInfo, StepResult};

/// Forwards every event to its inner notifiers in registration order.
///
/// A panic raised by one inner notifier is caught and logged; the remaining
/// notifiers still receive the event. Delivery is sequential on the calling
/// thread, so inner notifiers must not block; one that does delays the
/// notifiers registered after it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use stepwise::{DelegatingNotifier, NoProgressNotifier, ProgressNotifier, ScenarioInfo};
///
/// let notifier = DelegatingNotifier::new(vec![
///     Arc::new(NoProgressNotifier) as Arc<dyn ProgressNotifier>,
///     Arc::new(NoProgressNotifier),
/// ]);
/// assert_eq!(notifier.len(), 2);
/// notifier.scenario_start(&ScenarioInfo::new("anything"));
/// ```
#[derive(Clone, Default)]
pub struct DelegatingNotifier {
    notifiers: Vec<Arc<dyn ProgressNotifier>>,
}

impl DelegatingNotifier {
    /// Fan out to `notifiers`, in order.
    #[must_use]
    pub fn new(notifiers: Vec<Arc<dyn ProgressNotifier>>) -> Self {
        Self { notifiers }
    }

    /// Number of inner notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Whether there are no inner notifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    fn each(&self, event: &str, deliver: impl Fn(&dyn ProgressNotifier)) {
        for (index, notifier) in self.notifiers.iter().enumerate() {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| deliver(notifier.as_ref())));
            if let Err(payload) = delivered {
                log::warn!(
                    "progress notifier #{index} panicked on {event}: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

impl std::fmt::Debug for DelegatingNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatingNotifier")
            .field("notifiers", &self.notifiers.len())
            .finish()
    }
}

impl ProgressNotifier for DelegatingNotifier {
    fn feature_start(&self, feature: &FeatureInfo) {
        self.each("feature start", |n| n.feature_start(feature));
    }

    fn feature_finish(&self, feature: &FeatureResult) {
        self.each("feature finish", |n| n.feature_finish(feature));
    }

    fn scenario_start(&self, scenario: &ScenarioInfo) {
        self.each("scenario start", |n| n.scenario_start(scenario));
    }

    fn scenario_finish(&self, scenario: &ScenarioResult) {
        self.each("scenario finish", |n| n.scenario_finish(scenario));
    }

    fn step_start(&self, step: &StepInfo) {
        self.each("step start", |n| n.step_start(step));
    }

    fn step_finish(&self, step: &StepResult) {
        self.each("step finish", |n| n.step_finish(step));
    }

    fn step_comment(&self, step: &StepInfo, comment: &str) {
        self.each("step comment", |n| n.step_comment(step, comment));
    }

    fn run_finish(&self) {
        self.each("run finish", |n| n.run_finish());
    }
}

/// Notifier that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgressNotifier;

impl ProgressNotifier for NoProgressNotifier {
    fn feature_start(&self, _feature: &FeatureInfo) {}

    fn feature_finish(&self, _feature: &FeatureResult) {}

    fn scenario_start(&self, _scenario: &ScenarioInfo) {}

    fn scenario_finish(&self, _scenario: &ScenarioResult) {}
}
