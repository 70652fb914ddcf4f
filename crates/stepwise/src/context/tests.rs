//! Unit tests for the flow-scoped scenario context.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;

#[derive(Default)]
struct Counter(AtomicUsize);

impl ContextProperty for Counter {}

#[derive(Default)]
struct Marker;

impl ContextProperty for Marker {}

fn context(name: &str) -> Arc<ScenarioContext> {
    Arc::new(ScenarioContext::new(
        FeatureInfo::new("Context"),
        ScenarioInfo::new(name),
    ))
}

#[test]
fn current_fails_outside_any_flow() {
    assert_eq!(
        ScenarioContext::current().err(),
        Some(ContextError::NoActiveScenario)
    );
}

#[test]
fn set_current_fails_outside_any_flow() {
    assert_eq!(
        ScenarioContext::set_current(Some(context("stray"))),
        Err(ContextError::OutsideFlow)
    );
}

#[test]
fn properties_are_created_once_per_kind() {
    let context = context("properties");
    let first = context.get::<Counter>();
    first.0.fetch_add(2, Ordering::SeqCst);
    let second = context.get::<Counter>();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.0.load(Ordering::SeqCst), 2);
    let _marker = context.get::<Marker>();
    assert_eq!(context.get::<Counter>().0.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cleared_context_fails_fast() {
    ScenarioContext::flow(async {
        let Ok(()) = ScenarioContext::set_current(Some(context("cleared"))) else {
            panic!("inside a flow");
        };
        assert!(ScenarioContext::property::<Counter>().is_ok());
        let Ok(()) = ScenarioContext::set_current(None) else {
            panic!("inside a flow");
        };
        assert_eq!(
            ScenarioContext::property::<Counter>().err(),
            Some(ContextError::NoActiveScenario)
        );
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn context_follows_the_flow_across_suspension_points() {
    let tasks: Vec<_> = (0..16)
        .map(|index| {
            tokio::spawn(ScenarioContext::flow(async move {
                let name = format!("scenario-{index}");
                let Ok(()) = ScenarioContext::set_current(Some(context(&name))) else {
                    panic!("inside a flow");
                };
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    let Ok(current) = ScenarioContext::current() else {
                        panic!("context lost across an await");
                    };
                    assert_eq!(current.scenario().name(), name);
                }
            }))
        })
        .collect();
    for task in tasks {
        assert!(task.await.is_ok(), "scenario task panicked");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn propagate_carries_context_into_spawned_tasks() {
    ScenarioContext::flow(async {
        let Ok(()) = ScenarioContext::set_current(Some(context("parent"))) else {
            panic!("inside a flow");
        };
        let inherited = tokio::spawn(ScenarioContext::propagate(async {
            ScenarioContext::current().map(|current| current.scenario().name().to_owned())
        }))
        .await;
        assert_eq!(
            inherited.ok().and_then(Result::ok).as_deref(),
            Some("parent")
        );

        let detached = tokio::spawn(async { ScenarioContext::current().is_ok() }).await;
        assert_eq!(detached.ok(), Some(false));
    })
    .await;
}

#[tokio::test]
async fn comment_without_bound_step_is_rejected() {
    ScenarioContext::flow(async {
        assert_eq!(comment("early"), Err(ContextError::NoActiveScenario));
        let Ok(()) = ScenarioContext::set_current(Some(context("no step"))) else {
            panic!("inside a flow");
        };
        assert_eq!(comment("orphan"), Err(ContextError::NoCurrentStep));
    })
    .await;
}
