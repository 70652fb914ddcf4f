//! Pluggable aggregation of submitted feature results, and the report
//! writer hand-off contract.

use crate::error::BoxError;
use crate::result::FeatureResult;

/// Receives every submitted feature and produces the final collection.
///
/// Calls are serialised by the coordinator.
pub trait FeatureAggregator: Send {
    /// Accept one finished feature.
    fn aggregate(&mut self, feature: FeatureResult);

    /// Consume the aggregator, yielding the features handed to report
    /// writers.
    fn finish(self: Box<Self>) -> Vec<FeatureResult>;
}

/// Keeps every submitted feature, in submission order.
#[derive(Debug, Default)]
pub struct CollectingAggregator {
    features: Vec<FeatureResult>,
}

impl FeatureAggregator for CollectingAggregator {
    fn aggregate(&mut self, feature: FeatureResult) {
        self.features.push(feature);
    }

    fn finish(self: Box<Self>) -> Vec<FeatureResult> {
        self.features
    }
}

/// Merges features sharing a name into one result.
///
/// Several runner instances may represent the same logical feature. The
/// merged feature keeps the metadata of its first submission and appends
/// scenarios in submission order.
///
/// # Examples
///
/// ```
/// use stepwise::{FeatureAggregator, FeatureInfo, FeatureResult, MergingAggregator};
///
/// let mut aggregator = MergingAggregator::default();
/// aggregator.aggregate(FeatureResult::new(FeatureInfo::new("Login"), Vec::new()));
/// aggregator.aggregate(FeatureResult::new(FeatureInfo::new("Logout"), Vec::new()));
/// aggregator.aggregate(FeatureResult::new(FeatureInfo::new("Login"), Vec::new()));
/// let features = Box::new(aggregator).finish();
/// assert_eq!(features.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MergingAggregator {
    features: Vec<FeatureResult>,
}

impl FeatureAggregator for MergingAggregator {
    fn aggregate(&mut self, feature: FeatureResult) {
        let name = feature.info().name();
        if let Some(existing) = self
            .features
            .iter_mut()
            .find(|existing| existing.info().name() == name)
        {
            existing.extend_scenarios(feature.into_parts().1);
            return;
        }
        self.features.push(feature);
    }

    fn finish(self: Box<Self>) -> Vec<FeatureResult> {
        self.features
    }
}

/// Consumer of the final feature collection, such as a file report writer.
pub trait ReportWriter: Send + Sync {
    /// Name used when logging failures.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Write a report of `features`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while producing the report.
    fn write(&self, features: &[FeatureResult]) -> Result<(), BoxError>;
}
