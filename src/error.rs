//! Error types for the mid-price pipeline.
//!
//! Clean error handling using `thiserror`. Failures are never recovered
//! inside the pipeline; they propagate to the caller as a `LobError`.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, LobError>;

/// Main error type for the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LobError {
    /// Input file does not exist (or is unknown to an in-memory source)
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Any other I/O failure, tagged with the path involved
    #[error("IO error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// Input could not be decoded as a LOB matrix
    #[error("Malformed input {}: {reason}", path.display())]
    MalformedInput { path: PathBuf, reason: String },

    /// Flat data does not fit the `1 + 4 * depth` row width
    #[error("Shape mismatch: {len} values do not form rows of width {width} (depth={depth})")]
    ShapeMismatch { depth: usize, width: usize, len: usize },

    /// Depth whose row width `1 + 4 * depth` does not fit in memory
    #[error("Depth {depth} overflows the matrix row width")]
    DepthOverflow { depth: usize },

    /// Column index beyond the matrix width
    #[error("Column {column} out of range for matrix with {columns} columns")]
    ColumnOutOfRange { column: usize, columns: usize },

    /// Requested more levels than the source recorded
    #[error("Requested depth {requested} exceeds recorded depth {recorded}")]
    DepthExceeded { requested: usize, recorded: usize },

    /// Input path rejected by validation (not a file, wrong extension, ...)
    #[error("Invalid input {}: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to render or write the mid-price series
    #[error("Output error: {0}")]
    Output(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

impl LobError {
    /// Create a generic error from any string-like type.
    pub fn generic(msg: impl Into<String>) -> Self {
        LobError::Generic(msg.into())
    }

    /// Convert an I/O error on `path`, keeping not-found failures distinct.
    pub fn io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => LobError::FileNotFound(path),
            _ => LobError::Io {
                path,
                message: err.to_string(),
            },
        }
    }

    /// Create a decoding error for `path`.
    pub fn malformed(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        LobError::MalformedInput {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether this is a file-not-found class failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LobError::FileNotFound(_))
    }
}

impl From<csv::Error> for LobError {
    fn from(err: csv::Error) -> Self {
        LobError::Output(format!("CSV error: {err}"))
    }
}

impl From<serde_json::Error> for LobError {
    fn from(err: serde_json::Error) -> Self {
        LobError::Output(format!("JSON error: {err}"))
    }
}

impl From<String> for LobError {
    fn from(err: String) -> Self {
        LobError::Generic(err)
    }
}

impl From<&str> for LobError {
    fn from(err: &str) -> Self {
        LobError::Generic(err.to_string())
    }
}
