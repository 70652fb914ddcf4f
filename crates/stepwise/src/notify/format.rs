//! Plain-text rendering of progress events.
//!
//! Every function renders one complete block, ending in a newline, so a
//! sink can write it atomically.
//!
//! # Examples
//!
//! ```
//! use stepwise::notify::format;
//! use stepwise::ScenarioInfo;
//!
//! let mut out = String::new();
//! format::scenario_start(&mut out, &ScenarioInfo::new("refund").with_labels(["T-9"]))
//!     .expect("writing to a String succeeds");
//! assert_eq!(out, "SCENARIO: [T-9] refund\n");
//! ```

use std::fmt::{self, Write};

use crate::result::{
    ExecutionTime, FeatureInfo, FeatureResult, ScenarioInfo, ScenarioResult, StepInfo, StepResult,
};
use crate::status::ExecutionStatus;

const INDENT: &str = "  ";

fn write_labels<W: Write>(out: &mut W, labels: &[String]) -> fmt::Result {
    if labels.is_empty() {
        return Ok(());
    }
    write!(out, "[{}] ", labels.join("]["))
}

fn write_outcome<W: Write>(
    out: &mut W,
    status: ExecutionStatus,
    time: Option<ExecutionTime>,
) -> fmt::Result {
    write!(out, "{status}")?;
    if let Some(time) = time {
        write!(out, " after {time}")?;
    }
    Ok(())
}

/// Render the start of a feature.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn feature_start<W: Write>(out: &mut W, feature: &FeatureInfo) -> fmt::Result {
    out.write_str("FEATURE: ")?;
    write_labels(out, feature.labels())?;
    writeln!(out, "{}", feature.name())?;
    if let Some(description) = feature.description() {
        for line in description.lines() {
            writeln!(out, "{INDENT}{line}")?;
        }
    }
    Ok(())
}

/// Render the end of a feature with its aggregated outcome.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn feature_finish<W: Write>(out: &mut W, feature: &FeatureResult) -> fmt::Result {
    write!(out, "FEATURE FINISHED: {} (", feature.info().name())?;
    write_outcome(out, feature.status(), feature.execution_time())?;
    writeln!(out, ", {} scenario(s))", feature.scenarios().len())
}

/// Render the start of a scenario.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn scenario_start<W: Write>(out: &mut W, scenario: &ScenarioInfo) -> fmt::Result {
    writeln!(out, "SCENARIO: {scenario}")
}

/// Render a finished scenario, including the comments of its steps.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn scenario_finish<W: Write>(out: &mut W, scenario: &ScenarioResult) -> fmt::Result {
    write!(out, "{INDENT}SCENARIO RESULT: ")?;
    write_outcome(out, scenario.status(), scenario.execution_time())?;
    out.write_char('\n')?;
    if let Some(details) = scenario.status_details() {
        for line in details.lines() {
            writeln!(out, "{INDENT}{INDENT}{line}")?;
        }
    }
    for step in scenario.steps() {
        for comment in step.comments() {
            writeln!(out, "{INDENT}{INDENT}{}: /* {comment} */", step.info())?;
        }
    }
    Ok(())
}

/// Render the start of a step.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn step_start<W: Write>(out: &mut W, step: &StepInfo) -> fmt::Result {
    writeln!(out, "{INDENT}STEP {step}...")
}

/// Render a finished step.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn step_finish<W: Write>(out: &mut W, step: &StepResult) -> fmt::Result {
    write!(out, "{INDENT}STEP {} (", step.info())?;
    write_outcome(out, step.status(), step.execution_time())?;
    out.write_char(')')?;
    if let Some(details) = step.status_details() {
        write!(out, ": {details}")?;
    }
    out.write_char('\n')
}

/// Render a comment added to a running step.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn step_comment<W: Write>(out: &mut W, step: &StepInfo, comment: &str) -> fmt::Result {
    writeln!(out, "{INDENT}STEP {step}: /* {comment} */")
}

/// Status label combined with optional details, as `Failed: boom`.
#[must_use]
pub fn status_line(status: ExecutionStatus, details: Option<&str>) -> String {
    details.map_or_else(|| status.to_string(), |details| format!("{status}: {details}"))
}
