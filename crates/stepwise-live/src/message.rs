//! Line-delimited JSON messages pushed to browser clients.
//!
//! Every message is one JSON object per line:
//!
//! ```json
//! {"type":"stepFinish","value":"2/3 WHEN paying","detail":"Failed: declined"}
//! ```

use serde::{Deserialize, Serialize};
use stepwise::notify::format::status_line;
use stepwise::{FeatureInfo, FeatureResult, ScenarioInfo, ScenarioResult, StepInfo, StepResult};

/// Kind of a live message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    /// A feature started; `value` is its name, `detail` its description.
    FeatureStart,
    /// A feature finished; `detail` is its status.
    FeatureFinish,
    /// A scenario started; `value` is its labelled name.
    ScenarioStart,
    /// A scenario finished; `detail` is its status line.
    ScenarioFinish,
    /// A step started; `value` is `number/total KEYWORD name`.
    StepStart,
    /// A step finished; `detail` is its status line.
    StepFinish,
    /// A comment on a running step; `detail` is the comment text.
    Comment,
    /// Terminal sentinel; no message follows.
    Finish,
}

/// One message of the live stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMessage {
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Subject of the event.
    pub value: String,
    /// Status line or free text, when the event carries one.
    #[serde(default)]
    pub detail: Option<String>,
}

impl LiveMessage {
    fn new(kind: MessageType, value: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            detail,
        }
    }

    /// Message for a started feature.
    #[must_use]
    pub fn feature_start(feature: &FeatureInfo) -> Self {
        Self::new(
            MessageType::FeatureStart,
            feature.name(),
            feature.description().map(str::to_owned),
        )
    }

    /// Message for a finished feature.
    #[must_use]
    pub fn feature_finish(feature: &FeatureResult) -> Self {
        Self::new(
            MessageType::FeatureFinish,
            feature.info().name(),
            Some(status_line(feature.status(), None)),
        )
    }

    /// Message for a started scenario.
    #[must_use]
    pub fn scenario_start(scenario: &ScenarioInfo) -> Self {
        Self::new(MessageType::ScenarioStart, scenario.to_string(), None)
    }

    /// Message for a finished scenario.
    #[must_use]
    pub fn scenario_finish(scenario: &ScenarioResult) -> Self {
        Self::new(
            MessageType::ScenarioFinish,
            scenario.info().to_string(),
            Some(status_line(scenario.status(), scenario.status_details())),
        )
    }

    /// Message for a started step.
    #[must_use]
    pub fn step_start(step: &StepInfo) -> Self {
        Self::new(MessageType::StepStart, step.to_string(), None)
    }

    /// Message for a finished step.
    #[must_use]
    pub fn step_finish(step: &StepResult) -> Self {
        Self::new(
            MessageType::StepFinish,
            step.info().to_string(),
            Some(status_line(step.status(), step.status_details())),
        )
    }

    /// Message for a comment on a running step.
    #[must_use]
    pub fn comment(step: &StepInfo, comment: &str) -> Self {
        Self::new(MessageType::Comment, step.to_string(), Some(comment.to_owned()))
    }

    /// The terminal sentinel.
    #[must_use]
    pub fn finish() -> Self {
        Self::new(MessageType::Finish, String::new(), None)
    }

    /// Serialise as one newline-terminated JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use stepwise::{ExecutionStatus, StepResult};

    use super::*;

    #[test]
    fn step_finish_carries_the_status_line() {
        let step = StepResult::new(
            StepInfo::new(2, 3, "When", "paying"),
            ExecutionStatus::Failed,
            Some("declined".to_owned()),
            None,
            Vec::new(),
            None,
        );
        let Ok(line) = LiveMessage::step_finish(&step).to_line() else {
            panic!("message serialises");
        };
        assert_eq!(
            line,
            "{\"type\":\"stepFinish\",\"value\":\"2/3 WHEN paying\",\"detail\":\"Failed: declined\"}\n"
        );
    }

    #[test]
    fn finish_sentinel_has_no_detail() {
        let Ok(line) = LiveMessage::finish().to_line() else {
            panic!("message serialises");
        };
        assert_eq!(line, "{\"type\":\"finish\",\"value\":\"\",\"detail\":null}\n");
    }

    #[test]
    fn feature_start_uses_the_description_as_detail() {
        let feature = FeatureInfo::new("Checkout").with_description("Paying for an order");
        let message = LiveMessage::feature_start(&feature);
        assert_eq!(message.kind, MessageType::FeatureStart);
        assert_eq!(message.value, "Checkout");
        assert_eq!(message.detail.as_deref(), Some("Paying for an order"));
    }

    #[test]
    fn lines_parse_back_into_messages() {
        let Ok(message) = serde_json::from_str::<LiveMessage>(
            "{\"type\":\"comment\",\"value\":\"1/1 GIVEN x\",\"detail\":\"note\"}",
        ) else {
            panic!("valid line parses");
        };
        assert_eq!(message, LiveMessage::comment(&StepInfo::new(1, 1, "Given", "x"), "note"));
    }
}
