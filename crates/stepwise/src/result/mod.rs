//! Result model produced by the execution pipeline.
//!
//! Results form an append-only tree: a [`FeatureResult`] owns
//! [`ScenarioResult`]s, which own [`StepResult`]s. Values are built while a
//! scenario runs and exposed read-only once it has finished.

mod info;
mod records;

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

pub use info::{FeatureInfo, ScenarioInfo, StepInfo};
pub use records::{FeatureResult, ScenarioResult, StepResult};

/// Start timestamp and duration of an executed item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionTime {
    start: SystemTime,
    duration: Duration,
}

impl ExecutionTime {
    /// Create an execution time from its parts.
    #[must_use]
    pub const fn new(start: SystemTime, duration: Duration) -> Self {
        Self { start, duration }
    }

    /// Wall-clock instant at which execution began.
    #[must_use]
    pub const fn start(&self) -> SystemTime {
        self.start
    }

    /// Time spent executing.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Wall-clock instant at which execution ended.
    ///
    /// Saturates at `start` when the duration overflows the clock.
    #[must_use]
    pub fn end(&self) -> SystemTime {
        self.start.checked_add(self.duration).unwrap_or(self.start)
    }

    /// Smallest time span covering every provided execution time.
    ///
    /// Returns `None` when no item was timed.
    #[must_use]
    pub fn spanning<I>(times: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut iter = times.into_iter();
        let first = iter.next()?;
        let (start, end) = iter.fold((first.start, first.end()), |(start, end), time| {
            (start.min(time.start), end.max(time.end()))
        });
        let duration = end.duration_since(start).unwrap_or_default();
        Some(Self { start, duration })
    }
}

impl fmt::Display for ExecutionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.duration.as_millis();
        if millis < 1000 {
            write!(f, "{millis}ms")
        } else {
            write!(
                f,
                "{}.{:03}s",
                self.duration.as_secs(),
                self.duration.subsec_millis()
            )
        }
    }
}

/// Original failure kept alongside a failed step for diagnostics.
///
/// The cause is not part of the status contract, but report writers may
/// inspect the message and, when the failure was an error value, walk its
/// source chain.
#[derive(Clone, Debug)]
pub struct FailureCause {
    message: String,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl FailureCause {
    /// Create a cause from a message and an optional underlying error.
    #[must_use]
    pub fn new(message: impl Into<String>, source: Option<Arc<dyn Error + Send + Sync>>) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }

    /// Human-readable failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying error, when the failure carried one.
    #[must_use]
    pub fn source(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
