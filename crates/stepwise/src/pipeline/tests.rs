//! Unit tests for the execution pipeline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use rstest::{fixture, rstest};

use super::*;
use crate::config::EngineConfiguration;
use crate::context::comment;
use crate::error::ContextError;
use crate::result::{FeatureResult, ScenarioInfo, StepResult};
use crate::status::ExecutionStatus;

type Log = Arc<Mutex<Vec<String>>>;

#[fixture]
fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    crate::sync::lock(log).clone()
}

fn push(log: &Log, entry: impl Into<String>) {
    crate::sync::lock(log).push(entry.into());
}

fn feature() -> FeatureInfo {
    FeatureInfo::new("Pipeline")
}

fn passing(name: &str) -> StepDefinition {
    StepDefinition::sync("Given", name, || Ok(()))
}

fn recording(log: &Log, name: &'static str) -> StepDefinition {
    let log = Arc::clone(log);
    StepDefinition::sync("When", name, move || {
        push(&log, name);
        Ok(())
    })
}

fn build(config: EngineConfiguration) -> Pipeline {
    config.build().0
}

struct Tracer {
    name: &'static str,
    log: Log,
}

impl StepExtension for Tracer {
    fn around<'a>(
        &'a self,
        _step: &'a StepHandle,
        next: StepNext<'a>,
    ) -> BoxFuture<'a, Result<(), StepError>> {
        Box::pin(async move {
            push(&self.log, format!("{}-in", self.name));
            let outcome = next.run().await;
            push(&self.log, format!("{}-out", self.name));
            outcome
        })
    }
}

struct Veto;

impl StepExtension for Veto {
    fn around<'a>(
        &'a self,
        _step: &'a StepHandle,
        _next: StepNext<'a>,
    ) -> BoxFuture<'a, Result<(), StepError>> {
        Box::pin(async { Err::<(), _>(StepError::failed("vetoed by extension")) })
    }
}

struct RefuseScenario;

impl ScenarioExtension for RefuseScenario {
    fn around<'a>(
        &'a self,
        _scenario: &'a ScenarioHandle,
        _next: ScenarioNext<'a>,
    ) -> BoxFuture<'a, Result<(), ExtensionError>> {
        Box::pin(async { Err::<(), _>(ExtensionError::new("environment unavailable")) })
    }
}

struct PanicAfter;

impl ScenarioExtension for PanicAfter {
    fn around<'a>(
        &'a self,
        _scenario: &'a ScenarioHandle,
        next: ScenarioNext<'a>,
    ) -> BoxFuture<'a, Result<(), ExtensionError>> {
        Box::pin(async move {
            next.run().await?;
            teardown()
        })
    }
}

fn teardown() -> Result<(), ExtensionError> {
    panic!("teardown exploded");
}

struct Broken;

impl FailureClassifier for Broken {
    fn classify(&self, _error: StepError) -> Classification {
        panic!("classifier bug");
    }
}

struct Deadline(Duration);

impl ScenarioExtension for Deadline {
    fn around<'a>(
        &'a self,
        _scenario: &'a ScenarioHandle,
        next: ScenarioNext<'a>,
    ) -> BoxFuture<'a, Result<(), ExtensionError>> {
        Box::pin(async move {
            tokio::time::timeout(self.0, next.run())
                .await
                .map_err(|_| ExtensionError::new("scenario exceeded its deadline"))?
        })
    }
}

struct Events(Log);

impl ProgressNotifier for Events {
    fn feature_start(&self, _feature: &FeatureInfo) {}

    fn feature_finish(&self, _feature: &FeatureResult) {}

    fn scenario_start(&self, scenario: &ScenarioInfo) {
        push(&self.0, format!("scenario-start {}", scenario.name()));
    }

    fn scenario_finish(&self, scenario: &ScenarioResult) {
        push(&self.0, format!("scenario-finish {}", scenario.status()));
    }

    fn step_start(&self, step: &StepInfo) {
        push(&self.0, format!("step-start {}", step.number()));
    }

    fn step_finish(&self, step: &StepResult) {
        push(&self.0, format!("step-finish {} {}", step.info().number(), step.status()));
    }

    fn step_comment(&self, step: &StepInfo, comment: &str) {
        push(&self.0, format!("comment {} {comment}", step.number()));
    }
}

fn statuses(result: &ScenarioResult) -> Vec<ExecutionStatus> {
    result.steps().iter().map(StepResult::status).collect()
}

#[tokio::test]
async fn passing_steps_produce_passed_scenario() {
    let pipeline = build(EngineConfiguration::default());
    let definition = ScenarioDefinition::new("happy path")
        .with_step(passing("a"))
        .with_step(passing("b"));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Passed);
    assert_eq!(result.status_details(), None);
    assert!(result.execution_time().is_some());
    assert!(result.steps().iter().all(|step| step.execution_time().is_some()));
    let numbers: Vec<_> = result.steps().iter().map(|s| s.info().to_string()).collect();
    assert_eq!(numbers, ["1/2 GIVEN a", "2/2 GIVEN b"]);
}

#[rstest]
#[tokio::test]
async fn bypass_lets_later_steps_run(log: Log) {
    let pipeline = build(EngineConfiguration::default());
    let definition = ScenarioDefinition::new("partial")
        .with_step(recording(&log, "first"))
        .with_step(StepDefinition::sync("When", "optional", || {
            Err(StepError::bypass("not configured"))
        }))
        .with_step(recording(&log, "last"));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Bypassed);
    assert_eq!(result.status_details(), Some("not configured"));
    assert_eq!(
        statuses(&result),
        [ExecutionStatus::Passed, ExecutionStatus::Bypassed, ExecutionStatus::Passed]
    );
    assert_eq!(entries(&log), ["first", "last"]);
}

#[rstest]
#[case::failed(StepError::failed("total mismatch"), ExecutionStatus::Failed)]
#[case::ignored(StepError::ignore("needs hardware"), ExecutionStatus::Ignored)]
#[tokio::test]
async fn halting_outcome_leaves_remaining_steps_not_run(
    log: Log,
    #[case] error: StepError,
    #[case] expected: ExecutionStatus,
) {
    let pipeline = build(EngineConfiguration::default().enable_step_commenting());
    let definition = ScenarioDefinition::new("halts")
        .with_step(passing("setup"))
        .with_step(StepDefinition::sync("When", "breaks", move || Err(error)))
        .with_step(recording(&log, "never"));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), expected);
    assert_eq!(
        statuses(&result),
        [ExecutionStatus::Passed, expected, ExecutionStatus::NotRun]
    );
    let Some(skipped) = result.steps().last() else {
        panic!("scenario should keep all steps");
    };
    assert!(skipped.execution_time().is_none());
    assert!(skipped.comments().is_empty());
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn panicking_body_fails_with_its_message() {
    let pipeline = build(EngineConfiguration::default());
    let definition = ScenarioDefinition::new("panics").with_step(StepDefinition::new(
        "Then",
        "asserts",
        || async {
            tokio::task::yield_now().await;
            let total = [1, 1].iter().sum::<i32>();
            assert_eq!(total, 3, "arithmetic is broken");
            Ok(())
        },
    ));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Failed);
    let Some(details) = result.status_details() else {
        panic!("failed scenario should carry details");
    };
    assert!(details.contains("arithmetic is broken"));
    let Some(step) = result.steps().first() else {
        panic!("step result missing");
    };
    assert!(step.failure_cause().is_some());
}

#[tokio::test]
async fn bypass_macro_bypasses_the_step() {
    let pipeline = build(EngineConfiguration::default());
    let definition = ScenarioDefinition::new("macro")
        .with_step(StepDefinition::sync("Given", "a licence", || {
            crate::bypass!("licence server {} is down", "eu-1")
        }))
        .with_step(StepDefinition::sync("Then", "ignored", || {
            crate::ignore!("inconclusive")
        }));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(
        statuses(&result),
        [ExecutionStatus::Bypassed, ExecutionStatus::Ignored]
    );
    assert_eq!(result.status(), ExecutionStatus::Bypassed);
    assert_eq!(result.status_details(), Some("licence server eu-1 is down"));
}

#[rstest]
#[tokio::test]
async fn step_extensions_wrap_in_registration_order(log: Log) {
    let pipeline = build(
        EngineConfiguration::default()
            .with_step_extension(Tracer {
                name: "outer",
                log: Arc::clone(&log),
            })
            .with_step_extension(Tracer {
                name: "inner",
                log: Arc::clone(&log),
            }),
    );
    let definition = ScenarioDefinition::new("ordered").with_step(recording(&log, "body"));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Passed);
    assert_eq!(
        entries(&log),
        ["outer-in", "inner-in", "body", "inner-out", "outer-out"]
    );
}

#[rstest]
#[tokio::test]
async fn step_extension_error_is_classified(log: Log) {
    let pipeline = build(EngineConfiguration::default().with_step_extension(Veto));
    let definition = ScenarioDefinition::new("vetoed")
        .with_step(recording(&log, "body"))
        .with_step(recording(&log, "after"));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Failed);
    assert_eq!(result.status_details(), Some("vetoed by extension"));
    assert!(entries(&log).is_empty());
}

#[rstest]
#[tokio::test]
async fn scenario_extension_error_fails_the_scenario(log: Log) {
    let pipeline = build(EngineConfiguration::default().with_scenario_extension(RefuseScenario));
    let definition = ScenarioDefinition::new("refused").with_step(recording(&log, "body"));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Failed);
    assert_eq!(result.status_details(), Some("environment unavailable"));
    assert_eq!(statuses(&result), [ExecutionStatus::NotRun]);
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn scenario_extension_panic_keeps_step_results() {
    let pipeline = build(EngineConfiguration::default().with_scenario_extension(PanicAfter));
    let definition = ScenarioDefinition::new("teardown")
        .with_step(passing("one"))
        .with_step(passing("two"));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Failed);
    assert_eq!(result.status_details(), Some("teardown exploded"));
    assert_eq!(
        statuses(&result),
        [ExecutionStatus::Passed, ExecutionStatus::Passed]
    );
}

#[tokio::test]
async fn abandoned_step_is_sealed_as_it_stood() {
    let pipeline = build(
        EngineConfiguration::default()
            .enable_step_commenting()
            .with_scenario_extension(Deadline(Duration::from_millis(20))),
    );
    let definition = ScenarioDefinition::new("slow")
        .with_step(passing("quick"))
        .with_step(StepDefinition::new("When", "hangs", || async {
            comment("waiting for the queue")?;
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<(), StepError>(())
        }));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Failed);
    assert_eq!(result.status_details(), Some("scenario exceeded its deadline"));
    let Some(hung) = result.steps().get(1) else {
        panic!("step result missing");
    };
    assert_eq!(hung.status(), ExecutionStatus::NotRun);
    assert!(hung.execution_time().is_some());
    assert_eq!(hung.comments(), ["waiting for the queue"]);
}

#[tokio::test]
async fn comments_reach_the_current_step_only() {
    let pipeline = build(EngineConfiguration::default().enable_step_commenting());
    let definition = ScenarioDefinition::new("commented")
        .with_step(StepDefinition::new("Given", "a note", || async {
            comment("first note")?;
            tokio::task::yield_now().await;
            comment("second note")?;
            Ok::<(), StepError>(())
        }))
        .with_step(passing("quiet"));
    let result = pipeline.execute(&feature(), definition).await;
    let [noted, quiet] = result.steps() else {
        panic!("expected two step results");
    };
    assert_eq!(noted.comments(), ["first note", "second note"]);
    assert!(quiet.comments().is_empty());
    assert_eq!(
        ScenarioContext::current().err(),
        Some(ContextError::NoActiveScenario)
    );
}

#[tokio::test]
async fn comment_requires_step_commenting() {
    let pipeline = build(EngineConfiguration::default());
    let definition = ScenarioDefinition::new("uncommented").with_step(StepDefinition::sync(
        "Given",
        "a note",
        || {
            if matches!(comment("lost"), Err(ContextError::NoCurrentStep)) {
                Ok(())
            } else {
                Err(StepError::failed("comment should need a bound step"))
            }
        },
    ));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Passed);
}

#[tokio::test]
async fn context_is_visible_inside_steps() {
    let pipeline = build(EngineConfiguration::default());
    let definition = ScenarioDefinition::new("introspective").with_step(StepDefinition::new(
        "Then",
        "knows its scenario",
        || async {
            tokio::task::yield_now().await;
            let current = ScenarioContext::current()?;
            if current.scenario().name() == "introspective" && current.feature().name() == "Pipeline"
            {
                Ok(())
            } else {
                Err(StepError::failed("wrong context"))
            }
        },
    ));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Passed);
}

#[rstest]
#[tokio::test]
async fn notifications_follow_the_lifecycle(log: Log) {
    let pipeline = build(
        EngineConfiguration::default()
            .enable_step_commenting()
            .with_notifier(Events(Arc::clone(&log))),
    );
    let definition = ScenarioDefinition::new("observed")
        .with_step(StepDefinition::sync("Given", "talks", || {
            comment("hello")?;
            Ok(())
        }))
        .with_step(StepDefinition::sync("Then", "fails", || {
            Err(StepError::failed("nope"))
        }))
        .with_step(passing("skipped"));
    let _ = pipeline.execute(&feature(), definition).await;
    assert_eq!(
        entries(&log),
        [
            "scenario-start observed",
            "step-start 1",
            "comment 1 hello",
            "step-finish 1 Passed",
            "step-start 2",
            "step-finish 2 Failed",
            "scenario-finish Failed",
        ]
    );
}

#[tokio::test]
async fn classifier_defect_fails_the_scenario() {
    let pipeline = build(EngineConfiguration::default().with_classifier(Broken));
    let definition = ScenarioDefinition::new("misclassified")
        .with_step(passing("ok"))
        .with_step(StepDefinition::sync("When", "fails", || {
            Err(StepError::failed("boom"))
        }))
        .with_step(passing("after"));
    let result = pipeline.execute(&feature(), definition).await;
    assert_eq!(result.status(), ExecutionStatus::Failed);
    assert_eq!(result.status_details(), Some("classifier bug"));
    assert_eq!(
        statuses(&result),
        [ExecutionStatus::Passed, ExecutionStatus::NotRun, ExecutionStatus::NotRun]
    );
}

#[tokio::test]
async fn scenario_without_steps_is_not_run() {
    let pipeline = build(EngineConfiguration::default());
    let result = pipeline.execute(&feature(), ScenarioDefinition::new("empty")).await;
    assert_eq!(result.status(), ExecutionStatus::NotRun);
    assert_eq!(result.status_details(), None);
    assert!(result.steps().is_empty());
    assert!(result.execution_time().is_some());
}
