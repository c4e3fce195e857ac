//! CLI error types.

use thiserror::Error;

/// Errors surfaced to the user by `ccpctl`.
#[derive(Debug, Error)]
pub enum CliError {
    /// The control-plane client failed.
    #[error(transparent)]
    Client(#[from] ccp_client::Error),

    /// Loading, saving or reading the stored defaults failed.
    #[error("configuration error: {0}")]
    Config(#[from] ccp_config::ConfigError),

    /// A flag or argument is unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Build an invalid-argument error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
