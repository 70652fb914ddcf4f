//! Mutable shells of the step and scenario results while they execute.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime};

use crate::classify::Classification;
use crate::error::ContextError;
use crate::notify::ProgressNotifier;
use crate::result::{ExecutionTime, FeatureInfo, ScenarioInfo, ScenarioResult, StepInfo, StepResult};
use crate::status::ExecutionStatus;
use crate::sync::lock;

enum Phase {
    Pending,
    Running {
        started: SystemTime,
        clock: Instant,
        comments: Vec<String>,
    },
    Sealed(StepResult),
}

struct StepShell {
    info: StepInfo,
    notifier: Arc<dyn ProgressNotifier>,
    phase: Mutex<Phase>,
}

/// Shared handle to a step of the running scenario.
///
/// Clones refer to the same step. Comments are accepted only while the step
/// is running; once the step is sealed its result no longer changes.
#[derive(Clone)]
pub struct StepHandle {
    shell: Arc<StepShell>,
}

impl StepHandle {
    pub(crate) fn new(info: StepInfo, notifier: Arc<dyn ProgressNotifier>) -> Self {
        Self {
            shell: Arc::new(StepShell {
                info,
                notifier,
                phase: Mutex::new(Phase::Pending),
            }),
        }
    }

    /// Step identity.
    #[must_use]
    pub fn info(&self) -> &StepInfo {
        &self.shell.info
    }

    /// Append a comment to the running step.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::StepNotStarted`] before the step starts and
    /// [`ContextError::StepSealed`] after it finishes.
    pub fn comment(&self, text: impl Into<String>) -> Result<(), ContextError> {
        let text = text.into();
        {
            let mut phase = lock(&self.shell.phase);
            match &mut *phase {
                Phase::Running { comments, .. } => comments.push(text.clone()),
                Phase::Pending => {
                    return Err(ContextError::StepNotStarted {
                        step: self.shell.info.to_string(),
                    });
                }
                Phase::Sealed(_) => {
                    return Err(ContextError::StepSealed {
                        step: self.shell.info.to_string(),
                    });
                }
            }
        }
        self.shell.notifier.step_comment(&self.shell.info, &text);
        Ok(())
    }

    /// Status reached so far: `NotRun` until the step is sealed.
    #[must_use]
    pub fn status(&self) -> ExecutionStatus {
        match &*lock(&self.shell.phase) {
            Phase::Sealed(result) => result.status(),
            Phase::Pending | Phase::Running { .. } => ExecutionStatus::NotRun,
        }
    }

    /// Comments recorded so far.
    #[must_use]
    pub fn comments(&self) -> Vec<String> {
        match &*lock(&self.shell.phase) {
            Phase::Running { comments, .. } => comments.clone(),
            Phase::Sealed(result) => result.comments().to_vec(),
            Phase::Pending => Vec::new(),
        }
    }

    pub(crate) fn start(&self) {
        let mut phase = lock(&self.shell.phase);
        if matches!(*phase, Phase::Pending) {
            *phase = Phase::Running {
                started: SystemTime::now(),
                clock: Instant::now(),
                comments: Vec::new(),
            };
        }
    }

    /// Seal the step with its classified outcome. Sealing twice keeps the
    /// first result.
    pub(crate) fn seal(&self, outcome: Classification) -> StepResult {
        let mut phase = lock(&self.shell.phase);
        match std::mem::replace(&mut *phase, Phase::Pending) {
            Phase::Running {
                started,
                clock,
                comments,
            } => {
                let (status, details, cause) = outcome.into_parts();
                let time = ExecutionTime::new(started, clock.elapsed());
                let result = StepResult::new(
                    self.shell.info.clone(),
                    status,
                    details,
                    Some(time),
                    comments,
                    cause,
                );
                *phase = Phase::Sealed(result.clone());
                result
            }
            Phase::Sealed(result) => {
                *phase = Phase::Sealed(result.clone());
                result
            }
            Phase::Pending => {
                let (status, details, cause) = outcome.into_parts();
                let result =
                    StepResult::new(self.shell.info.clone(), status, details, None, Vec::new(), cause);
                *phase = Phase::Sealed(result.clone());
                result
            }
        }
    }

    /// Seal the step as it stands, returning its final result.
    ///
    /// A step that started but was never classified keeps `NotRun` along
    /// with its elapsed time and comments.
    pub(crate) fn seal_as_is(&self) -> StepResult {
        let mut phase = lock(&self.shell.phase);
        let result = match &*phase {
            Phase::Sealed(result) => return result.clone(),
            Phase::Pending => StepResult::not_run(self.shell.info.clone()),
            Phase::Running {
                started,
                clock,
                comments,
            } => StepResult::new(
                self.shell.info.clone(),
                ExecutionStatus::NotRun,
                None,
                Some(ExecutionTime::new(*started, clock.elapsed())),
                comments.clone(),
                None,
            ),
        };
        *phase = Phase::Sealed(result.clone());
        result
    }
}

impl fmt::Debug for StepHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepHandle")
            .field("info", &self.shell.info)
            .field("status", &self.status())
            .finish()
    }
}

/// Identity and steps of the scenario being executed.
#[derive(Debug)]
pub struct ScenarioHandle {
    feature: FeatureInfo,
    info: ScenarioInfo,
    steps: Vec<StepHandle>,
}

impl ScenarioHandle {
    pub(crate) const fn new(feature: FeatureInfo, info: ScenarioInfo, steps: Vec<StepHandle>) -> Self {
        Self {
            feature,
            info,
            steps,
        }
    }

    /// Feature the scenario belongs to.
    #[must_use]
    pub const fn feature(&self) -> &FeatureInfo {
        &self.feature
    }

    /// Scenario identity.
    #[must_use]
    pub const fn info(&self) -> &ScenarioInfo {
        &self.info
    }

    /// Step handles in declaration order.
    #[must_use]
    pub fn steps(&self) -> &[StepHandle] {
        &self.steps
    }

    /// Seal every step and build the scenario result.
    ///
    /// A defect overrides the aggregated status with `Failed` and its
    /// message.
    pub(crate) fn finish(self, defect: Option<String>, time: ExecutionTime) -> ScenarioResult {
        let steps: Vec<StepResult> = self.steps.iter().map(StepHandle::seal_as_is).collect();
        let (status, details) = if defect.is_some() {
            (ExecutionStatus::Failed, defect)
        } else {
            let details = steps
                .iter()
                .find(|step| {
                    !matches!(step.status(), ExecutionStatus::Passed | ExecutionStatus::NotRun)
                })
                .and_then(|step| step.status_details().map(str::to_owned));
            (
                ExecutionStatus::aggregate(steps.iter().map(StepResult::status)),
                details,
            )
        };
        ScenarioResult::new(self.info, status, details, Some(time), steps)
    }
}
