//! Execution status shared by steps, scenarios, and features.
//!
//! Scenario and feature statuses are never stored independently; they are
//! derived from their children with [`ExecutionStatus::aggregate`].

use std::fmt;

/// Outcome of a step, scenario, or feature.
///
/// # Examples
///
/// ```
/// use stepwise::ExecutionStatus;
///
/// let status = ExecutionStatus::aggregate([
///     ExecutionStatus::Passed,
///     ExecutionStatus::Bypassed,
///     ExecutionStatus::Failed,
/// ]);
/// assert_eq!(status, ExecutionStatus::Failed);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    /// The item was never reached.
    #[default]
    NotRun,
    /// The item completed normally.
    Passed,
    /// The item was skipped on purpose with a reason.
    Bypassed,
    /// The item was inconclusive according to the host framework.
    Ignored,
    /// The item failed.
    Failed,
}

impl ExecutionStatus {
    /// Return the label used in progress output and live messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotRun => "NotRun",
            Self::Passed => "Passed",
            Self::Bypassed => "Bypassed",
            Self::Ignored => "Ignored",
            Self::Failed => "Failed",
        }
    }

    const fn precedence(self) -> u8 {
        match self {
            Self::NotRun => 0,
            Self::Passed => 1,
            Self::Ignored => 2,
            Self::Bypassed => 3,
            Self::Failed => 4,
        }
    }

    /// Whether a step ending with this status stops the remaining steps of
    /// its scenario.
    #[must_use]
    pub const fn halts_scenario(self) -> bool {
        matches!(self, Self::Failed | Self::Ignored)
    }

    /// Derive a parent status from its children.
    ///
    /// `Failed` dominates `Bypassed`, which dominates `Ignored`, which
    /// dominates `Passed`. Children that never ran do not lower the result,
    /// and an empty child set yields [`ExecutionStatus::NotRun`].
    #[must_use]
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        statuses
            .into_iter()
            .max_by_key(|status| status.precedence())
            .unwrap_or_default()
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
