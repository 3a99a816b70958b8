//! Engine error types.

use std::path::PathBuf;

use tie_format_core::{ErrorCode, TieFormatError};

/// Errors from engine operations and configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Validation, resolution, or mutation failure.
    #[error(transparent)]
    TieFormat(#[from] TieFormatError),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config file I/O error.
    #[error("cannot read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// The reported error kind, for tie-format failures.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            EngineError::TieFormat(e) => Some(e.code()),
            EngineError::Toml(_) | EngineError::Io { .. } => None,
        }
    }

    /// The underlying tie-format failure, if any.
    pub fn as_tie_format(&self) -> Option<&TieFormatError> {
        match self {
            EngineError::TieFormat(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
