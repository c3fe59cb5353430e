//! Error taxonomy shared by every Clarity operation

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by suite construction and test library loading
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClarityError {
    #[error("out of memory while growing {0} storage")]
    OutOfMemory(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("test library not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to load test library {path}: {reason}")]
    LoadLibraryFailed { path: PathBuf, reason: String },

    #[error("invalid test library {path}: missing symbol '{symbol}'")]
    InvalidFormat { path: PathBuf, symbol: String },

    #[error("no test library is loaded")]
    LibraryNotLoaded,

    #[error("failed to unload test library {path}: {reason}")]
    UnloadLibraryFailed { path: PathBuf, reason: String },

    #[error("suite '{0}' does not exist")]
    SuiteIsNull(String),
}

impl ClarityError {
    /// Stable numeric status for exit codes and foreign callers.
    ///
    /// `0` is reserved for success and never returned here.
    pub fn status_code(&self) -> i32 {
        match self {
            ClarityError::OutOfMemory(_) => 1,
            ClarityError::InvalidArgument(_) => 2,
            ClarityError::FileNotFound(_) => 3,
            ClarityError::LoadLibraryFailed { .. } => 4,
            ClarityError::InvalidFormat { .. } => 5,
            ClarityError::LibraryNotLoaded => 6,
            ClarityError::UnloadLibraryFailed { .. } => 7,
            ClarityError::SuiteIsNull(_) => 8,
        }
    }
}

/// Result type for Clarity operations
pub type ClarityResult<T> = Result<T, ClarityError>;
