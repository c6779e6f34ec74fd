//! services/client/src/error.rs
//!
//! Defines the primary error type for the terminal client.

use crate::config::ConfigError;
use paper_desk_core::ChatError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The chat channel could not be built for the configured API base.
    #[error("Chat Error: {0}")]
    Chat(#[from] ChatError),

    /// Represents an error from the HTTP client library.
    #[error("HTTP Error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding the sign-in socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
