//! Live notifier configuration parsed from environment variables.
//!
//! Every setting can be overridden through a variable prefixed with
//! `STEPWISE_LIVE_`.

use std::env;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use crate::error::LiveError;

/// Environment variable holding the bind address.
pub const ADDR_VAR: &str = "STEPWISE_LIVE_ADDR";

/// Environment variable holding the log level.
pub const LOG_LEVEL_VAR: &str = "STEPWISE_LIVE_LOG_LEVEL";

/// Loopback on an ephemeral port.
pub const DEFAULT_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0));

/// Log level enumeration matching tracing levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Everything, including per-connection chatter.
    Trace,
    /// Connection and stream lifecycle.
    Debug,
    /// Server start and stop.
    #[default]
    Info,
    /// Lagging clients and failed connections.
    Warn,
    /// Server failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = LiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(LiveError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive.
    #[must_use]
    pub const fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Configuration for the live HTML notifier.
///
/// # Environment Variables
///
/// - `STEPWISE_LIVE_ADDR`: socket address to bind, such as `127.0.0.1:8377`
/// - `STEPWISE_LIVE_LOG_LEVEL`: trace, debug, info, warn or error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConfig {
    /// Address the HTTP endpoint binds to.
    pub addr: SocketAddr,
    /// Log level for [`init_logging`](crate::init_logging).
    pub log_level: LogLevel,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR,
            log_level: LogLevel::default(),
        }
    }
}

impl LiveConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::InvalidConfig`] if a variable holds an invalid
    /// value.
    pub fn from_env() -> Result<Self, LiveError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::InvalidConfig`] if a variable holds an invalid
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LiveError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ADDR_VAR) {
            config.addr = value.trim().parse().map_err(|_| {
                LiveError::InvalidConfig(format!(
                    "invalid bind address '{value}', expected host:port"
                ))
            })?;
        }
        if let Some(value) = lookup(LOG_LEVEL_VAR) {
            config.log_level = value.parse()?;
        }
        Ok(config)
    }

    /// Apply optional overrides that take precedence over the environment.
    #[must_use]
    pub fn apply_overrides(mut self, addr: Option<SocketAddr>, log_level: Option<LogLevel>) -> Self {
        if let Some(addr) = addr {
            self.addr = addr;
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self
    }

    /// Set the bind address.
    #[must_use]
    pub const fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set the log level.
    #[must_use]
    pub const fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("DEBUG", LogLevel::Debug)]
    #[case("Info", LogLevel::Info)]
    #[case("warning", LogLevel::Warn)]
    #[case(" error ", LogLevel::Error)]
    fn log_level_parses_case_insensitively(#[case] input: &str, #[case] expected: LogLevel) {
        assert_eq!(input.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_unknown_values() {
        let Err(error) = "chatty".parse::<LogLevel>() else {
            panic!("unknown level should be rejected");
        };
        assert!(error.to_string().contains("unknown log level 'chatty'"));
    }

    #[test]
    fn defaults_bind_loopback_on_an_ephemeral_port() {
        let config = LiveConfig::default();
        assert!(config.addr.ip().is_loopback());
        assert_eq!(config.addr.port(), 0);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn lookup_without_variables_yields_defaults() {
        assert_eq!(LiveConfig::from_lookup(lookup(&[])).ok(), Some(LiveConfig::default()));
    }

    #[test]
    fn lookup_reads_both_variables() {
        let Ok(config) = LiveConfig::from_lookup(lookup(&[
            (ADDR_VAR, "127.0.0.1:8377"),
            (LOG_LEVEL_VAR, "debug"),
        ])) else {
            panic!("valid variables should parse");
        };
        assert_eq!(config.addr.port(), 8377);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[rstest]
    #[case(ADDR_VAR, "localhost", "invalid bind address")]
    #[case(LOG_LEVEL_VAR, "loud", "unknown log level")]
    fn lookup_rejects_invalid_values(
        #[case] name: &str,
        #[case] value: &str,
        #[case] message: &str,
    ) {
        let Err(error) = LiveConfig::from_lookup(lookup(&[(name, value)])) else {
            panic!("invalid value should be rejected");
        };
        assert!(error.to_string().contains(message));
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let Ok(addr) = "127.0.0.1:9000".parse::<SocketAddr>() else {
            panic!("literal address parses");
        };
        let config = LiveConfig::default().apply_overrides(Some(addr), None);
        assert_eq!(config.addr, addr);
        assert_eq!(config.log_level, LogLevel::Info);

        let config = config.apply_overrides(None, Some(LogLevel::Error));
        assert_eq!(config.addr, addr);
        assert_eq!(config.log_level, LogLevel::Error);
    }
}
