//! Progress observers fired by the pipeline and the coordinator.
//!
//! Notifiers see every lifecycle event of a run. Several notifiers compose
//! through [`DelegatingNotifier`], which forwards events in registration
//! order and isolates a panicking notifier from the rest.

mod delegating;
pub mod format;
mod text;

pub use delegating::{DelegatingNotifier, NoProgressNotifier};
pub use text::{CallbackSink, LineSink, TextNotifier, WriterSink};

use crate::result::{FeatureInfo, FeatureResult, ScenarioInfo, ScenarioResult, StepInfo, StepResult};

/// Observer of run progress.
///
/// Events for different scenarios may arrive concurrently from several
/// threads; implementations synchronise their own output and return
/// promptly, handing slow work to a buffer or a background task.
pub trait ProgressNotifier: Send + Sync {
    /// A feature runner was created.
    fn feature_start(&self, feature: &FeatureInfo);

    /// A feature finished and was submitted to the coordinator.
    fn feature_finish(&self, feature: &FeatureResult);

    /// A scenario is about to run its extension chain.
    fn scenario_start(&self, scenario: &ScenarioInfo);

    /// A scenario finished.
    fn scenario_finish(&self, scenario: &ScenarioResult);

    /// A step is about to run.
    fn step_start(&self, step: &StepInfo) {
        let _ = step;
    }

    /// A step was sealed.
    fn step_finish(&self, step: &StepResult) {
        let _ = step;
    }

    /// A comment was added to a running step.
    fn step_comment(&self, step: &StepInfo, comment: &str) {
        let _ = (step, comment);
    }

    /// The coordinator is disposing; no further events follow.
    fn run_finish(&self) {}
}
