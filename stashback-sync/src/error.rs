//! Error types for stashback-sync.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures from a gatherer or a remote store call.
///
/// During gathering these are fatal for the run. From `put` / `remove` they
/// only fail the one action and end up in the log stream.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The object key is empty, absolute or escapes the bucket.
    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    /// A push was requested for a record with no local source path.
    #[error("no local source for '{name}'")]
    MissingSource { name: String },

    /// The call did not finish before its deadline.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// The store refused the operation.
    #[error("{0}")]
    Rejected(String),
}

/// All errors that can end a run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("error returned while gathering local files, err: {0}")]
    LocalGather(#[source] StoreError),

    #[error("error returned while gathering remote files, err: {0}")]
    RemoteGather(#[source] StoreError),

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("task join failure: {0}")]
    Join(String),

    /// Report output failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn report_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
