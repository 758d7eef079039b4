use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CritFixError {
    #[error("Filesystem error on {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backup failed for {path}: {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Anchor not found: {0}")]
    PatternAnchorNotFound(String),

    #[error("Invalid rule pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl CritFixError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn backup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::BackupFailed {
            path: path.into(),
            source,
        }
    }

    /// Backup failures weaken the safety guarantee for a file, so callers
    /// report them separately from ordinary errors.
    pub fn is_backup_failure(&self) -> bool {
        matches!(self, Self::BackupFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, CritFixError>;
