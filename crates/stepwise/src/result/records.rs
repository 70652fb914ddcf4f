//! Sealed step, scenario, and feature results.

use super::{ExecutionTime, FailureCause, FeatureInfo, ScenarioInfo, StepInfo};
use crate::status::ExecutionStatus;

/// Outcome of one step.
#[derive(Clone, Debug)]
pub struct StepResult {
    info: StepInfo,
    status: ExecutionStatus,
    status_details: Option<String>,
    execution_time: Option<ExecutionTime>,
    comments: Vec<String>,
    cause: Option<FailureCause>,
}

impl StepResult {
    /// Create a result for a step that has not run.
    #[must_use]
    pub const fn not_run(info: StepInfo) -> Self {
        Self {
            info,
            status: ExecutionStatus::NotRun,
            status_details: None,
            execution_time: None,
            comments: Vec::new(),
            cause: None,
        }
    }

    /// Create a result with every field supplied.
    #[must_use]
    pub const fn new(
        info: StepInfo,
        status: ExecutionStatus,
        status_details: Option<String>,
        execution_time: Option<ExecutionTime>,
        comments: Vec<String>,
        cause: Option<FailureCause>,
    ) -> Self {
        Self {
            info,
            status,
            status_details,
            execution_time,
            comments,
            cause,
        }
    }

    /// Step identity.
    #[must_use]
    pub const fn info(&self) -> &StepInfo {
        &self.info
    }

    /// Step status.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Reason or failure message, when the step did not simply pass.
    #[must_use]
    pub fn status_details(&self) -> Option<&str> {
        self.status_details.as_deref()
    }

    /// Timing, absent for steps that never ran.
    #[must_use]
    pub const fn execution_time(&self) -> Option<ExecutionTime> {
        self.execution_time
    }

    /// Comments appended while the step was running, in order.
    #[must_use]
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Original failure for failed steps.
    #[must_use]
    pub const fn failure_cause(&self) -> Option<&FailureCause> {
        self.cause.as_ref()
    }
}

/// Outcome of one scenario.
#[derive(Clone, Debug)]
pub struct ScenarioResult {
    info: ScenarioInfo,
    status: ExecutionStatus,
    status_details: Option<String>,
    execution_time: Option<ExecutionTime>,
    steps: Vec<StepResult>,
}

impl ScenarioResult {
    /// Create a scenario result.
    #[must_use]
    pub const fn new(
        info: ScenarioInfo,
        status: ExecutionStatus,
        status_details: Option<String>,
        execution_time: Option<ExecutionTime>,
        steps: Vec<StepResult>,
    ) -> Self {
        Self {
            info,
            status,
            status_details,
            execution_time,
            steps,
        }
    }

    /// Scenario identity.
    #[must_use]
    pub const fn info(&self) -> &ScenarioInfo {
        &self.info
    }

    /// Scenario status.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Details of the first step that did not pass, or of an extension
    /// defect.
    #[must_use]
    pub fn status_details(&self) -> Option<&str> {
        self.status_details.as_deref()
    }

    /// Timing of the whole scenario.
    #[must_use]
    pub const fn execution_time(&self) -> Option<ExecutionTime> {
        self.execution_time
    }

    /// Step results in declaration order.
    #[must_use]
    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }
}

/// Outcome of one feature.
///
/// # Examples
///
/// ```
/// use stepwise::{ExecutionStatus, FeatureInfo, FeatureResult, ScenarioInfo, ScenarioResult};
///
/// let scenario = ScenarioResult::new(
///     ScenarioInfo::new("pays"),
///     ExecutionStatus::Passed,
///     None,
///     None,
///     Vec::new(),
/// );
/// let feature = FeatureResult::new(FeatureInfo::new("Payments"), vec![scenario]);
/// assert_eq!(feature.status(), ExecutionStatus::Passed);
/// assert_eq!(feature.scenarios().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct FeatureResult {
    info: FeatureInfo,
    scenarios: Vec<ScenarioResult>,
}

impl FeatureResult {
    /// Create a feature result.
    #[must_use]
    pub const fn new(info: FeatureInfo, scenarios: Vec<ScenarioResult>) -> Self {
        Self { info, scenarios }
    }

    /// Feature identity.
    #[must_use]
    pub const fn info(&self) -> &FeatureInfo {
        &self.info
    }

    /// Scenario results in completion order.
    #[must_use]
    pub fn scenarios(&self) -> &[ScenarioResult] {
        &self.scenarios
    }

    /// Status aggregated over the scenarios.
    #[must_use]
    pub fn status(&self) -> ExecutionStatus {
        ExecutionStatus::aggregate(self.scenarios.iter().map(ScenarioResult::status))
    }

    /// Time span covering every timed scenario.
    #[must_use]
    pub fn execution_time(&self) -> Option<ExecutionTime> {
        ExecutionTime::spanning(
            self.scenarios
                .iter()
                .filter_map(ScenarioResult::execution_time),
        )
    }

    /// Append scenarios, keeping those already present.
    pub(crate) fn extend_scenarios(&mut self, scenarios: impl IntoIterator<Item = ScenarioResult>) {
        self.scenarios.extend(scenarios);
    }

    /// Split into identity and scenarios.
    #[must_use]
    pub fn into_parts(self) -> (FeatureInfo, Vec<ScenarioResult>) {
        (self.info, self.scenarios)
    }
}
