//! Identity metadata for features, scenarios, and steps.

use std::fmt;

/// Identity of a feature.
///
/// # Examples
///
/// ```
/// use stepwise::FeatureInfo;
///
/// let info = FeatureInfo::new("Payments")
///     .with_labels(["PAY-12"])
///     .with_description("Customers pay invoices online");
/// assert_eq!(info.name(), "Payments");
/// assert_eq!(info.labels(), ["PAY-12"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureInfo {
    name: String,
    labels: Vec<String>,
    description: Option<String>,
}

impl FeatureInfo {
    /// Create feature metadata with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attach labels such as ticket identifiers.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Feature name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feature labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Feature description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Identity of a scenario.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScenarioInfo {
    name: String,
    labels: Vec<String>,
    categories: Vec<String>,
}

impl ScenarioInfo {
    /// Create scenario metadata with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attach labels such as ticket identifiers.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Attach categories used to group scenarios in reports.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenario labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Scenario categories.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

impl fmt::Display for ScenarioInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.labels.is_empty() {
            write!(f, "[{}] ", self.labels.join("]["))?;
        }
        f.write_str(&self.name)
    }
}

/// Identity of a step within its scenario.
///
/// `Display` renders the form used by progress output: `2/3 WHEN name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepInfo {
    number: usize,
    total: usize,
    keyword: Option<String>,
    name: String,
}

impl StepInfo {
    /// Create step metadata.
    ///
    /// `number` is one-based. An empty keyword is stored as no keyword.
    #[must_use]
    pub fn new(number: usize, total: usize, keyword: impl Into<String>, name: impl Into<String>) -> Self {
        let keyword = keyword.into();
        Self {
            number,
            total,
            keyword: (!keyword.is_empty()).then_some(keyword),
            name: name.into(),
        }
    }

    /// One-based position of the step in its scenario.
    #[must_use]
    pub const fn number(&self) -> usize {
        self.number
    }

    /// Number of steps in the scenario.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Step type label such as `Given`, if any.
    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    /// Step name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StepInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ", self.number, self.total)?;
        if let Some(keyword) = &self.keyword {
            write!(f, "{} ", keyword.to_uppercase())?;
        }
        f.write_str(&self.name)
    }
}
