//! Core execution engine for `stepwise`.
//!
//! The crate runs scenarios made of already-resolved steps, classifies every
//! step outcome, measures timing, and aggregates the results into feature
//! trees that report writers consume at the end of a run.
//!
//! The moving parts, leaves first:
//!
//! - [`result`] and [`status`]: the immutable result model.
//! - [`context`]: the ambient, flow-scoped scenario context and the
//!   [`comment`] helper built on it.
//! - [`classify`]: maps a step failure to a status and details.
//! - [`pipeline`]: the step and scenario extension chains around each
//!   invocation.
//! - [`notify`]: progress observers and the ordered fan-out.
//! - [`coordinator`] and [`runner`]: the process-scoped collector and the
//!   entry points a host test framework calls.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use stepwise::{
//!     EngineConfiguration, ExecutionStatus, FeatureCoordinator, FeatureInfo,
//!     ScenarioDefinition, StepDefinition, StepError,
//! };
//!
//! let coordinator = Arc::new(FeatureCoordinator::new());
//! coordinator
//!     .initialize(EngineConfiguration::default())
//!     .expect("coordinator starts once");
//!
//! let feature = coordinator
//!     .feature_runner(FeatureInfo::new("Accounts"))
//!     .expect("coordinator is running");
//! let scenario = ScenarioDefinition::new("Opening an account")
//!     .with_step(StepDefinition::sync("Given", "a customer", || Ok(())))
//!     .with_step(StepDefinition::sync("Then", "audit runs", || {
//!         Err(StepError::bypass("audit service is offline"))
//!     }));
//!
//! let result = feature
//!     .new_scenario(scenario)
//!     .expect("feature is open")
//!     .run()
//!     .expect("runtime builds");
//! assert_eq!(result.status(), ExecutionStatus::Bypassed);
//!
//! feature.finish().expect("no scenario in flight");
//! let features = coordinator.dispose().expect("coordinator is running");
//! assert_eq!(features.len(), 1);
//! ```

pub mod classify;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
mod macros;
pub mod notify;
mod panic;
pub mod pipeline;
pub mod result;
pub mod runner;
pub mod status;
mod sync;

pub use classify::{Classification, DefaultClassifier, FailureClassifier};
pub use config::EngineConfiguration;
pub use context::{ContextProperty, CurrentStep, ScenarioContext, comment};
pub use coordinator::{
    CollectingAggregator, FeatureAggregator, FeatureCoordinator, MergingAggregator, ReportWriter,
};
pub use error::{BoxError, ContextError, CoordinatorError, PanicPayload, StepError};
pub use notify::{
    CallbackSink, DelegatingNotifier, LineSink, NoProgressNotifier, ProgressNotifier,
    TextNotifier, WriterSink,
};
pub use panic::panic_message;
pub use pipeline::{
    ExtensionError, ScenarioDefinition, ScenarioExtension, ScenarioHandle, ScenarioNext,
    StepCommentingExtension, StepDefinition, StepExtension, StepFuture, StepHandle, StepNext,
};
pub use result::{
    ExecutionTime, FailureCause, FeatureInfo, FeatureResult, ScenarioInfo, ScenarioResult,
    StepInfo, StepResult,
};
pub use runner::{FeatureRunner, ScenarioRunner};
pub use status::ExecutionStatus;
