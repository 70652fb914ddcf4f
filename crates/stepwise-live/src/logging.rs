//! Structured logging for the live notifier.
//!
//! Logs go to stderr so they never mix with a host framework's test output
//! on stdout.

use tracing_subscriber::EnvFilter;

use crate::config::LiveConfig;

fn filter_from_config(config: &LiveConfig) -> EnvFilter {
    EnvFilter::new(config.log_level.as_filter_str())
}

/// Initialise the global tracing subscriber from `config`.
///
/// If a global subscriber is already set, the call is ignored; the first
/// subscriber wins.
pub fn init_logging(config: &LiveConfig) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from_config(config))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::config::LogLevel;

    #[test]
    #[serial]
    fn init_logging_is_idempotent() {
        let config = LiveConfig::default();
        init_logging(&config);
        init_logging(&config.with_log_level(LogLevel::Trace));
    }

    #[test]
    fn filter_uses_config_log_level() {
        let config = LiveConfig::default().with_log_level(LogLevel::Debug);
        assert_eq!(filter_from_config(&config).to_string(), "debug");
    }
}
