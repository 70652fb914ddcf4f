//! Line-oriented text notifier for consoles and host test output.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use super::{ProgressNotifier, format};
use crate::result::{FeatureInfo, FeatureResult, ScenarioInfo, ScenarioResult, StepInfo, StepResult};
use crate::sync::lock;

/// Destination for rendered progress blocks.
///
/// `write_block` receives one complete block of newline-terminated lines.
/// Implementations must write it without interleaving with blocks written
/// concurrently from other threads.
pub trait LineSink: Send + Sync {
    /// Write one block.
    fn write_block(&self, block: &str);
}

/// Sink writing blocks to an [`io::Write`] under a lock.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the wrapped writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> LineSink for WriterSink<W> {
    fn write_block(&self, block: &str) {
        let mut writer = lock(&self.writer);
        if let Err(error) = writer
            .write_all(block.as_bytes())
            .and_then(|()| writer.flush())
        {
            log::warn!("failed to write progress output: {error}");
        }
    }
}

/// Sink handing every line to a callback, such as a host framework's
/// test-output writer.
pub struct CallbackSink<F> {
    callback: F,
    serial: Mutex<()>,
}

impl<F: Fn(&str) + Send + Sync> CallbackSink<F> {
    /// Wrap a callback invoked once per line, without the trailing newline.
    #[must_use]
    pub const fn new(callback: F) -> Self {
        Self {
            callback,
            serial: Mutex::new(()),
        }
    }
}

impl<F> fmt::Debug for CallbackSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSink").finish_non_exhaustive()
    }
}

impl<F: Fn(&str) + Send + Sync> LineSink for CallbackSink<F> {
    fn write_block(&self, block: &str) {
        let _serial = lock(&self.serial);
        for line in block.lines() {
            (self.callback)(line);
        }
    }
}

/// Renders progress events as plain text lines.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use stepwise::{ProgressNotifier, ScenarioInfo, TextNotifier};
///
/// let lines = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&lines);
/// let notifier = TextNotifier::callback(move |line| {
///     sink.lock().expect("lines lock").push(line.to_owned());
/// });
/// notifier.scenario_start(&ScenarioInfo::new("checkout"));
/// assert_eq!(*lines.lock().expect("lines lock"), ["SCENARIO: checkout"]);
/// ```
pub struct TextNotifier {
    sink: Box<dyn LineSink>,
}

impl TextNotifier {
    /// Render into an arbitrary sink.
    #[must_use]
    pub fn new(sink: impl LineSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    /// Console notifier writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(WriterSink::new(io::stdout()))
    }

    /// Console notifier writing to standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(WriterSink::new(io::stderr()))
    }

    /// Notifier writing to any writer.
    #[must_use]
    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::new(WriterSink::new(writer))
    }

    /// Notifier handing each line to `callback`.
    #[must_use]
    pub fn callback<F: Fn(&str) + Send + Sync + 'static>(callback: F) -> Self {
        Self::new(CallbackSink::new(callback))
    }

    fn emit(&self, render: impl FnOnce(&mut String) -> fmt::Result) {
        let mut block = String::new();
        if render(&mut block).is_err() {
            log::warn!("failed to render progress output");
            return;
        }
        self.sink.write_block(&block);
    }
}

impl fmt::Debug for TextNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextNotifier").finish_non_exhaustive()
    }
}

impl ProgressNotifier for TextNotifier {
    fn feature_start(&self, feature: &FeatureInfo) {
        self.emit(|out| format::feature_start(out, feature));
    }

    fn feature_finish(&self, feature: &FeatureResult) {
        self.emit(|out| format::feature_finish(out, feature));
    }

    fn scenario_start(&self, scenario: &ScenarioInfo) {
        self.emit(|out| format::scenario_start(out, scenario));
    }

    fn scenario_finish(&self, scenario: &ScenarioResult) {
        self.emit(|out| format::scenario_finish(out, scenario));
    }

    fn step_start(&self, step: &StepInfo) {
        self.emit(|out| format::step_start(out, step));
    }

    fn step_finish(&self, step: &StepResult) {
        self.emit(|out| format::step_finish(out, step));
    }

    fn step_comment(&self, step: &StepInfo, comment: &str) {
        self.emit(|out| format::step_comment(out, step, comment));
    }
}
