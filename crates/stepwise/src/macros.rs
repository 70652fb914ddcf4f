//! Public macro helpers exported by `stepwise`.
//!
//! The macros remain available at the crate root via `#[macro_export]`.

/// Bypass the current step with a reason.
///
/// Unwinds with a [`BypassRequest`](crate::classify::BypassRequest) payload
/// that the classifier records as `Bypassed`. The scenario continues with
/// its next step. Step bodies that return a `Result` should prefer
/// [`StepError::bypass`](crate::StepError::bypass).
///
/// # Examples
///
/// ```
/// use stepwise::{ExecutionStatus, ScenarioDefinition, StepDefinition};
///
/// let step = StepDefinition::sync("Given", "a licensed feature", || {
///     stepwise::bypass!("licence server unavailable in {}", "CI");
/// });
/// let _ = ScenarioDefinition::new("licensing").with_step(step);
/// ```
#[macro_export]
macro_rules! bypass {
    ($msg:expr $(,)?) => {{
        $crate::classify::BypassRequest::raise(Into::<String>::into($msg))
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::classify::BypassRequest::raise(format!($fmt, $($arg)*))
    }};
}

/// Mark the current step as inconclusive with a reason.
///
/// Unwinds with an [`IgnoreRequest`](crate::classify::IgnoreRequest) payload
/// that the classifier records as `Ignored`. Remaining steps of the scenario
/// do not run.
#[macro_export]
macro_rules! ignore {
    ($msg:expr $(,)?) => {{
        $crate::classify::IgnoreRequest::raise(Into::<String>::into($msg))
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::classify::IgnoreRequest::raise(format!($fmt, $($arg)*))
    }};
}
