//! Error types for the producer pipelines
//!
//! Every failure is terminal for the current request; nothing is retried.

use crate::config::ConfigError;
use crate::solver::SolveError;
use syslab_artifact::{HashError, StoreError, UriError};

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    /// Store failure (unknown kind, traversal, not found, I/O)
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Startup configuration failure
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Solver backend failure
    #[error("solver error: {0}")]
    Solve(#[from] SolveError),

    /// Export requested in a format other than HTML
    #[error("unsupported format '{0}': only html is supported")]
    UnsupportedFormat(String),

    /// Request parameters rejected before running a kernel
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Identity could not be computed
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// Payload could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<UriError> for LabError {
    fn from(err: UriError) -> Self {
        Self::Store(StoreError::Uri(err))
    }
}

impl LabError {
    /// Create an invalid-parameters error
    #[inline]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameters(reason.into())
    }

    /// True if the caller can fix the request; false for environment
    /// failures (I/O, configuration)
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Store(err) => err.is_client_error(),
            Self::Config(_) | Self::Solve(_) | Self::Serialization(_) => false,
            Self::UnsupportedFormat(_) | Self::InvalidParameters(_) | Self::Hash(_) => true,
        }
    }
}
