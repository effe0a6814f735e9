//! Error taxonomy for discovery, generation and persistence.
//!
//! None of these are fatal: each one is surfaced to the user as a message and
//! leaves the owning session in a retryable state.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while discovering installed models.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Ollama backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("No models found. Please install a model using 'ollama pull <model-name>'")]
    NoModelsInstalled,
}

/// Failures of a single completion request. Always recoverable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Could not reach the model backend: {0}")]
    ConnectFailed(String),
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The blocking write task was cancelled or panicked before reporting back.
    #[error("Background write did not complete: {0}")]
    Interrupted(String),
}

impl PersistenceError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// What a session reports to the UI after a failed exchange.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
