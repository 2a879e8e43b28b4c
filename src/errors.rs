use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation failed for {path:?}: {reason}")]
    Operation { path: PathBuf, reason: String },
}

/// Why a guarded operation refused to touch a path.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DenyReason {
    NotAllowed,
    ForbiddenPath,
    NotAFile,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotAllowed => "Not allowed",
            Self::ForbiddenPath => "Forbidden path",
            Self::NotAFile => "Not a file",
        };
        write!(f, "{label}")
    }
}
