//! Push-based live HTML progress notifier for `stepwise`.
//!
//! [`LiveHtmlNotifier`] starts a local HTTP endpoint when it is created. A
//! browser opening the endpoint receives a static page that tails one
//! line-delimited JSON stream of progress messages. Clients that connect
//! late see only later messages; a terminal `finish` message tells every
//! client to stop waiting.
//!
//! Configuration comes from `STEPWISE_LIVE_*` environment variables through
//! [`LiveConfig`], and [`init_logging`] installs a `tracing` subscriber
//! writing to stderr.

pub mod config;
pub mod error;
pub mod logging;
pub mod message;
mod notifier;
mod server;
mod stream;

pub use config::{LiveConfig, LogLevel};
pub use error::LiveError;
pub use logging::init_logging;
pub use message::{LiveMessage, MessageType};
pub use notifier::LiveHtmlNotifier;
