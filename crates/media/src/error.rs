use std::{error::Error as StdError, path::PathBuf, time::Duration};

/// Failure resolving or reading a remote media source.
///
/// `InvalidIdentifier` is the "not a valid identifier" signal; every other
/// variant means the fetch itself failed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("not a valid source identifier: {identifier}")]
    InvalidIdentifier { identifier: String },

    #[error("{tool} is not installed or not in PATH")]
    ToolMissing { tool: &'static str },

    #[error("{tool} exited with {status}: {stderr}")]
    ProcessFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl SourceError {
    #[must_use]
    pub fn invalid_identifier(identifier: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn is_invalid_identifier(&self) -> bool {
        matches!(self, Self::InvalidIdentifier { .. })
    }
}

/// Failure materializing a stream on local disk.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("failed to create staging directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The read side failed: network error or the source process died.
    #[error("source stream failed: {0}")]
    Source(#[from] SourceError),

    #[error("source stream produced no data")]
    Empty,
}

impl StageError {
    /// Whether the local filesystem (not the remote source) is at fault.
    #[must_use]
    pub fn is_filesystem(&self) -> bool {
        matches!(self, Self::CreateDir { .. } | Self::Write { .. })
    }
}

/// Failure of the out-of-process conversion delegate.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("conversion delegate is not available")]
    Unavailable,

    #[error("conversion delegate exited with {status}: {stderr}")]
    ProcessFailed { status: String, stderr: String },

    #[error("conversion produced no output at {0}")]
    EmptyOutput(PathBuf),

    #[error("conversion timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to run conversion delegate: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Keep only the last `max` bytes of a process's stderr, on a char boundary.
pub(crate) fn stderr_tail(stderr: &[u8], max: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("…{}", &text[start..])
}
