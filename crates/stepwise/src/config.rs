//! Engine configuration consumed once by the feature coordinator.
//!
//! The configuration fixes everything a run shares: the extension chains,
//! the failure classifier, progress notifiers, the feature aggregator, and
//! the report writers. Lists keep their registration order.

use std::fmt;
use std::sync::Arc;

use crate::classify::{DefaultClassifier, FailureClassifier};
use crate::coordinator::{CollectingAggregator, FeatureAggregator, ReportWriter};
use crate::notify::{DelegatingNotifier, ProgressNotifier};
use crate::pipeline::{Pipeline, ScenarioExtension, StepCommentingExtension, StepExtension};

/// Settings for one engine run.
///
/// # Examples
///
/// ```
/// use stepwise::{EngineConfiguration, TextNotifier};
///
/// let config = EngineConfiguration::default()
///     .enable_step_commenting()
///     .with_notifier(TextNotifier::stderr());
/// assert!(config.is_step_commenting_enabled());
/// assert_eq!(config.notifiers().len(), 1);
/// assert_eq!(config.step_extensions().len(), 1);
/// ```
pub struct EngineConfiguration {
    step_extensions: Vec<Arc<dyn StepExtension>>,
    scenario_extensions: Vec<Arc<dyn ScenarioExtension>>,
    notifiers: Vec<Arc<dyn ProgressNotifier>>,
    step_commenting: bool,
    classifier: Arc<dyn FailureClassifier>,
    aggregator: Box<dyn FeatureAggregator>,
    report_writers: Vec<Arc<dyn ReportWriter>>,
}

impl Default for EngineConfiguration {
    fn default() -> Self {
        Self {
            step_extensions: Vec::new(),
            scenario_extensions: Vec::new(),
            notifiers: Vec::new(),
            step_commenting: false,
            classifier: Arc::new(DefaultClassifier::new()),
            aggregator: Box::new(CollectingAggregator::default()),
            report_writers: Vec::new(),
        }
    }
}

impl EngineConfiguration {
    /// Append a step extension; earlier registrations wrap later ones.
    #[must_use]
    pub fn with_step_extension(mut self, extension: impl StepExtension + 'static) -> Self {
        self.step_extensions.push(Arc::new(extension));
        self
    }

    /// Append a scenario extension; earlier registrations wrap later ones.
    ///
    /// The engine's own context extension always wraps every registered
    /// scenario extension.
    #[must_use]
    pub fn with_scenario_extension(mut self, extension: impl ScenarioExtension + 'static) -> Self {
        self.scenario_extensions.push(Arc::new(extension));
        self
    }

    /// Append a progress notifier.
    #[must_use]
    pub fn with_notifier(self, notifier: impl ProgressNotifier + 'static) -> Self {
        self.with_shared_notifier(Arc::new(notifier))
    }

    /// Append a progress notifier that the caller keeps a handle to.
    #[must_use]
    pub fn with_shared_notifier(mut self, notifier: Arc<dyn ProgressNotifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Bind the running step as current so [`comment`](crate::comment)
    /// works. The commenting extension takes its place in the step chain at
    /// the point of this call; calling it again has no effect.
    #[must_use]
    pub fn enable_step_commenting(mut self) -> Self {
        if !self.step_commenting {
            self.step_commenting = true;
            self.step_extensions.push(Arc::new(StepCommentingExtension));
        }
        self
    }

    /// Replace the failure classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl FailureClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Replace the feature aggregator.
    #[must_use]
    pub fn with_aggregator(mut self, aggregator: impl FeatureAggregator + 'static) -> Self {
        self.aggregator = Box::new(aggregator);
        self
    }

    /// Append a report writer, invoked at disposal in registration order.
    #[must_use]
    pub fn with_report_writer(mut self, writer: impl ReportWriter + 'static) -> Self {
        self.report_writers.push(Arc::new(writer));
        self
    }

    /// Registered step extensions, outermost first.
    #[must_use]
    pub fn step_extensions(&self) -> &[Arc<dyn StepExtension>] {
        &self.step_extensions
    }

    /// Registered scenario extensions, outermost first.
    #[must_use]
    pub fn scenario_extensions(&self) -> &[Arc<dyn ScenarioExtension>] {
        &self.scenario_extensions
    }

    /// Registered progress notifiers, in delivery order.
    #[must_use]
    pub fn notifiers(&self) -> &[Arc<dyn ProgressNotifier>] {
        &self.notifiers
    }

    /// Registered report writers, in invocation order.
    #[must_use]
    pub fn report_writers(&self) -> &[Arc<dyn ReportWriter>] {
        &self.report_writers
    }

    /// Whether [`enable_step_commenting`](Self::enable_step_commenting) was
    /// called.
    #[must_use]
    pub const fn is_step_commenting_enabled(&self) -> bool {
        self.step_commenting
    }

    /// Compose the pipeline and split off the parts the coordinator keeps.
    pub(crate) fn build(self) -> (Pipeline, Box<dyn FeatureAggregator>, Vec<Arc<dyn ReportWriter>>) {
        let notifier: Arc<dyn ProgressNotifier> = Arc::new(DelegatingNotifier::new(self.notifiers));
        let pipeline = Pipeline::new(
            self.step_extensions,
            self.scenario_extensions,
            self.classifier,
            notifier,
        );
        (pipeline, self.aggregator, self.report_writers)
    }
}

impl fmt::Debug for EngineConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfiguration")
            .field("step_extensions", &self.step_extensions.len())
            .field("scenario_extensions", &self.scenario_extensions.len())
            .field("notifiers", &self.notifiers.len())
            .field("step_commenting", &self.step_commenting)
            .field("report_writers", &self.report_writers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use futures_util::future::BoxFuture;

    use super::*;
    use crate::error::StepError;
    use crate::pipeline::{StepHandle, StepNext};

    struct Marker;

    impl StepExtension for Marker {
        fn around<'a>(
            &'a self,
            _step: &'a StepHandle,
            next: StepNext<'a>,
        ) -> BoxFuture<'a, Result<(), StepError>> {
            next.run()
        }
    }

    #[test]
    fn step_commenting_is_registered_once_in_call_order() {
        let config = EngineConfiguration::default()
            .with_step_extension(Marker)
            .enable_step_commenting()
            .enable_step_commenting()
            .with_step_extension(Marker);
        assert!(config.is_step_commenting_enabled());
        assert_eq!(config.step_extensions().len(), 3);
    }

    #[test]
    fn default_configuration_is_empty() {
        let config = EngineConfiguration::default();
        assert!(config.step_extensions().is_empty());
        assert!(config.scenario_extensions().is_empty());
        assert!(config.notifiers().is_empty());
        assert!(config.report_writers().is_empty());
        assert!(!config.is_step_commenting_enabled());
    }
}
