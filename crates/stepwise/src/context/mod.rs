//! Ambient, flow-scoped scenario context.
//!
//! Each scenario execution runs inside its own flow scope backed by a Tokio
//! task-local slot. The slot travels with the scenario's future, so the
//! context stays visible across `.await` points even when the runtime
//! resumes the future on another worker thread, while sibling scenarios on
//! the same threads never see it. Futures handed to `tokio::spawn` start a
//! new task and must be wrapped with [`ScenarioContext::propagate`] to keep
//! the context.

mod current_step;

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

pub use current_step::{CurrentStep, comment};

use crate::error::ContextError;
use crate::result::{FeatureInfo, ScenarioInfo};
use crate::sync::lock;

tokio::task_local! {
    static CURRENT: RefCell<Option<Arc<ScenarioContext>>>;
}

/// A value kind stored in the scenario context.
///
/// One instance per kind is created lazily, on first access, for every
/// scenario.
pub trait ContextProperty: Any + Send + Sync + Default {}

type PropertyMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Per-scenario bag of lazily created properties.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use stepwise::{ContextProperty, FeatureInfo, ScenarioContext, ScenarioInfo};
///
/// #[derive(Default)]
/// struct Retries(AtomicUsize);
/// impl ContextProperty for Retries {}
///
/// let context = Arc::new(ScenarioContext::new(
///     FeatureInfo::new("Sync"),
///     ScenarioInfo::new("retries"),
/// ));
/// let observed = tokio::runtime::Builder::new_current_thread()
///     .build()
///     .expect("runtime builds")
///     .block_on(ScenarioContext::flow(async move {
///         ScenarioContext::set_current(Some(context)).expect("inside a flow");
///         let retries = ScenarioContext::property::<Retries>().expect("scenario active");
///         retries.0.fetch_add(1, Ordering::SeqCst);
///         ScenarioContext::property::<Retries>()
///             .expect("scenario active")
///             .0
///             .load(Ordering::SeqCst)
///     }));
/// assert_eq!(observed, 1);
/// assert!(ScenarioContext::current().is_err());
/// ```
pub struct ScenarioContext {
    feature: FeatureInfo,
    scenario: ScenarioInfo,
    properties: Mutex<PropertyMap>,
}

impl ScenarioContext {
    /// Create an empty context for the given scenario.
    #[must_use]
    pub fn new(feature: FeatureInfo, scenario: ScenarioInfo) -> Self {
        Self {
            feature,
            scenario,
            properties: Mutex::new(HashMap::new()),
        }
    }

    /// Feature the scenario belongs to.
    #[must_use]
    pub const fn feature(&self) -> &FeatureInfo {
        &self.feature
    }

    /// Scenario this context belongs to.
    #[must_use]
    pub const fn scenario(&self) -> &ScenarioInfo {
        &self.scenario
    }

    /// Return the property of kind `P`, creating it on first access.
    #[must_use]
    pub fn get<P: ContextProperty>(&self) -> Arc<P> {
        let mut properties = lock(&self.properties);
        let id = TypeId::of::<P>();
        if let Some(property) = properties
            .get(&id)
            .and_then(|existing| Arc::clone(existing).downcast::<P>().ok())
        {
            return property;
        }
        let created = Arc::new(P::default());
        let erased: Arc<dyn Any + Send + Sync> = Arc::clone(&created) as _;
        properties.insert(id, erased);
        created
    }

    /// Context of the scenario executing on the current flow.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoActiveScenario`] outside a scenario
    /// execution or after its context has been cleared.
    pub fn current() -> Result<Arc<Self>, ContextError> {
        CURRENT
            .try_with(|slot| slot.borrow().clone())
            .ok()
            .flatten()
            .ok_or(ContextError::NoActiveScenario)
    }

    /// Install or clear the context of the current flow.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::OutsideFlow`] when called outside a future
    /// running under [`flow`](Self::flow).
    pub fn set_current(context: Option<Arc<Self>>) -> Result<(), ContextError> {
        CURRENT
            .try_with(|slot| {
                slot.replace(context);
            })
            .map_err(|_| ContextError::OutsideFlow)
    }

    /// Shorthand for `ScenarioContext::current()?.get::<P>()`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoActiveScenario`] when no scenario is
    /// executing on the current flow.
    pub fn property<P: ContextProperty>() -> Result<Arc<P>, ContextError> {
        Ok(Self::current()?.get::<P>())
    }

    /// Run `future` in a fresh flow scope with no active context.
    pub async fn flow<F: Future>(future: F) -> F::Output {
        CURRENT.scope(RefCell::new(None), future).await
    }

    /// Carry the current context into a future that will run as a
    /// separate task.
    ///
    /// Outside a scenario the future gets an empty flow scope.
    pub fn propagate<F: Future>(future: F) -> impl Future<Output = F::Output> {
        let captured = Self::current().ok();
        CURRENT.scope(RefCell::new(captured), future)
    }
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("feature", &self.feature.name())
            .field("scenario", &self.scenario.name())
            .field("properties", &lock(&self.properties).len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
