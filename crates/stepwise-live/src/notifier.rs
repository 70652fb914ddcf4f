//! Progress notifier pushing every event to connected browsers.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use stepwise::{
    FeatureInfo, FeatureResult, ProgressNotifier, ScenarioInfo, ScenarioResult, StepInfo,
    StepResult,
};

use crate::config::LiveConfig;
use crate::error::LiveError;
use crate::message::LiveMessage;
use crate::server::LiveServer;
use crate::stream::EventStream;

/// Push-based HTML progress notifier.
///
/// Construction binds the HTTP endpoint. Open [`url`](Self::url) in a
/// browser to follow the run. The stream is finished when the coordinator
/// reports `run_finish`; the server stops on [`shutdown`](Self::shutdown) or
/// when the notifier is dropped.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use stepwise::{EngineConfiguration, FeatureCoordinator};
/// use stepwise_live::{LiveConfig, LiveHtmlNotifier};
///
/// let live = Arc::new(LiveHtmlNotifier::start(&LiveConfig::from_env()?)?);
/// eprintln!("live progress at {}", live.url());
///
/// let coordinator = Arc::new(FeatureCoordinator::new());
/// coordinator.initialize(EngineConfiguration::default().with_shared_notifier(live))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct LiveHtmlNotifier {
    addr: SocketAddr,
    stream: Arc<EventStream>,
    server: Mutex<Option<LiveServer>>,
}

impl LiveHtmlNotifier {
    /// Bind the endpoint described by `config` and start serving.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::Io`] if the address cannot be bound or the
    /// server thread cannot be started.
    pub fn start(config: &LiveConfig) -> Result<Self, LiveError> {
        Self::bind(config.addr)
    }

    /// Bind `addr` and start serving.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::Io`] if the address cannot be bound or the
    /// server thread cannot be started.
    pub fn bind(addr: SocketAddr) -> Result<Self, LiveError> {
        let stream = Arc::new(EventStream::new());
        let server = LiveServer::start(addr, Arc::clone(&stream))?;
        Ok(Self {
            addr: server.addr(),
            stream,
            server: Mutex::new(Some(server)),
        })
    }

    /// Address the endpoint is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// URL of the live page.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Whether the terminal sentinel has been published.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.stream.is_finished()
    }

    /// Publish the terminal sentinel. Later events are dropped.
    pub fn finish(&self) {
        self.stream.finish();
    }

    /// Finish the stream and stop the server. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.finish();
        let server = self
            .server
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut server) = server {
            server.stop();
        }
    }

    fn publish(&self, message: &LiveMessage) {
        self.stream.publish(message);
    }
}

impl fmt::Debug for LiveHtmlNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveHtmlNotifier")
            .field("addr", &self.addr)
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

impl Drop for LiveHtmlNotifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ProgressNotifier for LiveHtmlNotifier {
    fn feature_start(&self, feature: &FeatureInfo) {
        self.publish(&LiveMessage::feature_start(feature));
    }

    fn feature_finish(&self, feature: &FeatureResult) {
        self.publish(&LiveMessage::feature_finish(feature));
    }

    fn scenario_start(&self, scenario: &ScenarioInfo) {
        self.publish(&LiveMessage::scenario_start(scenario));
    }

    fn scenario_finish(&self, scenario: &ScenarioResult) {
        self.publish(&LiveMessage::scenario_finish(scenario));
    }

    fn step_start(&self, step: &StepInfo) {
        self.publish(&LiveMessage::step_start(step));
    }

    fn step_finish(&self, step: &StepResult) {
        self.publish(&LiveMessage::step_finish(step));
    }

    fn step_comment(&self, step: &StepInfo, comment: &str) {
        self.publish(&LiveMessage::comment(step, comment));
    }

    fn run_finish(&self) {
        self.finish();
    }
}
