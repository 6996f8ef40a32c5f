//! Error types for CLI operations.

use bridge::BridgeError;
use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ContractError),

    /// Command-line overrides produced an unusable configuration
    #[error("Invalid override --{flag}: {message}")]
    InvalidOverride { flag: &'static str, message: String },

    /// Bridge construction or startup failure
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Mock engine thread could not be spawned
    #[error("Failed to start mock engine: {0}")]
    Engine(#[source] std::io::Error),

    /// Graceful shutdown error
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_override(flag: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            flag,
            message: message.into(),
        }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}
