//! Error types for tasksync operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for tasksync operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The local store executable could not be started.
    #[error("failed to launch '{}': {source}", .program.display())]
    LaunchFailed {
        /// The executable that failed to start.
        program: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The local store process did not finish within the configured bound.
    #[error("'{}' did not finish within {timeout_secs}s", .program.display())]
    TimedOut {
        /// The executable that was killed.
        program: PathBuf,
        /// The bound that was exceeded, in seconds.
        timeout_secs: u64,
    },

    /// The query output was not a JSON array of records.
    #[error("could not parse local store output: {0}")]
    QueryParseFailed(#[source] serde_json::Error),

    /// The query exited non-zero without parseable output.
    #[error("local store query exited with code {exit_code}")]
    QueryFailed {
        /// Exit code of the query command.
        exit_code: i32,
    },

    /// The add command exited non-zero.
    #[error("local store refused the new task (exit code {exit_code})")]
    LocalStoreWriteFailed {
        /// Exit code of the add command.
        exit_code: i32,
    },

    /// A status load was superseded by a cache reset before it settled.
    #[error("status was reset while it was being resolved")]
    StaleRead,

    /// A project key is not of the form `owner/repo`.
    #[error("invalid project '{0}': expected 'owner/repo'")]
    InvalidProject(String),

    /// No issue with this number was fetched for the project.
    #[error("issue #{id} not found in {project}")]
    IssueNotFound {
        /// Project the issue was looked up in.
        project: String,
        /// Remote issue number.
        id: u64,
    },

    /// The remote issue source answered with an error.
    #[error("remote issue source error: {0}")]
    Remote(String),

    /// HTTP transport error talking to the remote issue source.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns true for failures to run the local store at all, as opposed
    /// to the store running and reporting a problem.
    #[must_use]
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, Self::LaunchFailed { .. } | Self::TimedOut { .. })
    }
}

/// A specialized Result type for tasksync operations.
pub type Result<T> = std::result::Result<T, Error>;
