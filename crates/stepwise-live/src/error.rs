//! Error types for the live notifier.

use thiserror::Error;

/// Errors raised while configuring or starting the live notifier.
#[derive(Debug, Error)]
pub enum LiveError {
    /// An invalid configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_error_displays_message() {
        let error = LiveError::InvalidConfig("unknown log level".to_owned());
        assert_eq!(error.to_string(), "invalid configuration: unknown log level");
    }

    #[test]
    fn io_error_converts_from_std_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let error: LiveError = io_err.into();
        assert!(error.to_string().contains("address in use"));
    }

    #[test]
    fn every_variant_is_a_config_or_io_failure() {
        let errors = [
            LiveError::InvalidConfig("bad address".to_owned()),
            LiveError::Io(std::io::Error::other("refused")),
        ];
        let labels: Vec<_> = errors
            .iter()
            .map(|error| match error {
                LiveError::InvalidConfig(_) => "config",
                LiveError::Io(_) => "io",
            })
            .collect();
        assert_eq!(labels, ["config", "io"]);
    }
}
