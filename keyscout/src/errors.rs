/// Error types for keyscout.
///
/// Errors fall into three groups, and callers are expected to treat them differently:
///
/// 1. **Input errors** (`DirectoryNotFound`, `NoTextFiles`, `ConfigError`) are detected
///    before any worker starts and are reported straight to the user.
/// 2. **File read errors** (`FileNotFound`, `PermissionDenied`, `EncodingError`, `IoError`)
///    are raised per file inside a worker. The worker logs them, records the file as
///    unreadable and carries on with the rest of its chunk.
/// 3. **Worker failures** (`WorkerFailed`, `WorkersLost`, `WorkerTimeout`) are fatal to
///    the run. The aggregator surfaces them instead of returning an incomplete mapping.
///
/// ```rust,ignore
/// match search(&config, files) {
///     Ok(result) => // print result,
///     Err(SearchError::WorkerFailed { worker, reason }) => // abort the run,
///     Err(e) => // other run-level error
/// }
/// ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during a keyword scan
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::str::Utf8Error,
    },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("The directory '{0}' does not exist")]
    DirectoryNotFound(PathBuf),
    #[error("No text files found in directory '{0}'")]
    NoTextFiles(PathBuf),
    #[error("Worker {worker} failed: {reason}")]
    WorkerFailed { worker: usize, reason: String },
    #[error("Worker channel closed early: received {received} of {expected} results")]
    WorkersLost { expected: usize, received: usize },
    #[error("Timed out waiting for workers: received {received} of {expected} results")]
    WorkerTimeout { expected: usize, received: usize },
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound(path.into())
    }

    pub fn no_text_files(path: impl Into<PathBuf>) -> Self {
        Self::NoTextFiles(path.into())
    }

    pub fn worker_failed(worker: usize, reason: impl Into<String>) -> Self {
        Self::WorkerFailed {
            worker,
            reason: reason.into(),
        }
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::str::Utf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    /// Maps an IO error raised while opening or reading `path` onto the
    /// file-level variants.
    pub fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(e),
        }
    }
}
