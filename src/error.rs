//! Error types shared by the index core and its I/O boundary.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while building or querying the word index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A key, path or archive member that was asked for does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Reading or writing an external resource failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A buffer tagged as an archive could not be parsed.
    #[error("malformed archive: {0}")]
    Archive(String),

    /// A required setting is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl IndexError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Filesystem path the error is about, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for IndexError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::FileNotFound => Self::NotFound("archive member".to_string()),
            other => Self::Archive(other.to_string()),
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Errors raised by the pipeline orchestrator itself.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Startup validation failed before any stage was spawned.
    #[error(transparent)]
    Startup(#[from] IndexError),

    /// A stage thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A stage thread panicked before finishing.
    #[error("stage {0} panicked")]
    StagePanicked(String),
}
