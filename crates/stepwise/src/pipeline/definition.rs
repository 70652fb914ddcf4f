//! Already-resolved step and scenario definitions handed to the pipeline.

use std::fmt;
use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::StepError;
use crate::result::ScenarioInfo;

/// Future produced by a step body.
pub type StepFuture = BoxFuture<'static, Result<(), StepError>>;

pub(crate) type StepBody = Box<dyn FnOnce() -> StepFuture + Send>;

/// An invocable step with its metadata.
pub struct StepDefinition {
    keyword: String,
    name: String,
    body: StepBody,
}

impl StepDefinition {
    /// Define a step with an asynchronous body.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepwise::StepDefinition;
    ///
    /// let step = StepDefinition::new("When", "the order ships", || async {
    ///     tokio::task::yield_now().await;
    ///     Ok(())
    /// });
    /// assert_eq!(step.name(), "the order ships");
    /// ```
    #[must_use]
    pub fn new<F, Fut>(keyword: impl Into<String>, name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StepError>> + Send + 'static,
    {
        Self {
            keyword: keyword.into(),
            name: name.into(),
            body: Box::new(move || body().boxed()),
        }
    }

    /// Define a step with a synchronous body, adapted to a ready future.
    #[must_use]
    pub fn sync<F>(keyword: impl Into<String>, name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce() -> Result<(), StepError> + Send + 'static,
    {
        Self {
            keyword: keyword.into(),
            name: name.into(),
            body: Box::new(move || Box::pin(std::future::ready(body()))),
        }
    }

    /// Step type label such as `Given`; may be empty.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Step name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, String, StepBody) {
        (self.keyword, self.name, self.body)
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("keyword", &self.keyword)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A scenario: identity plus steps in declaration order.
#[derive(Debug)]
pub struct ScenarioDefinition {
    info: ScenarioInfo,
    steps: Vec<StepDefinition>,
}

impl ScenarioDefinition {
    /// Start a scenario definition with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_info(ScenarioInfo::new(name))
    }

    /// Start a scenario definition from existing metadata.
    #[must_use]
    pub const fn from_info(info: ScenarioInfo) -> Self {
        Self {
            info,
            steps: Vec::new(),
        }
    }

    /// Attach labels such as ticket identifiers.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info = self.info.with_labels(labels);
        self
    }

    /// Attach report categories.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info = self.info.with_categories(categories);
        self
    }

    /// Append a step.
    #[must_use]
    pub fn with_step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Scenario metadata.
    #[must_use]
    pub const fn info(&self) -> &ScenarioInfo {
        &self.info
    }

    /// Steps in declaration order.
    #[must_use]
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub(crate) fn into_parts(self) -> (ScenarioInfo, Vec<StepDefinition>) {
        (self.info, self.steps)
    }
}
