//! Delegate error types.

use thiserror::Error;

/// Errors from running a delegate command.
#[derive(Debug, Error)]
pub enum DelegateError {
    /// The backend process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The delegate exited unsuccessfully.
    #[error("delegate {command} exited with {}: {stderr}", describe_exit(.exit_code))]
    Failed {
        /// Verb of the failed command.
        command: String,
        /// Exit code, `None` when killed by a signal.
        exit_code: Option<i32>,
        /// Captured diagnostic output.
        stderr: String,
    },

    /// The backend gave up waiting for the delegate.
    #[error("delegate timed out after {timeout_secs}s")]
    TimedOut {
        /// Configured backend timeout.
        timeout_secs: u64,
    },

    /// The surrounding build or poll was interrupted.
    #[error("delegate invocation cancelled")]
    Cancelled,

    /// IO error while talking to the child process.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_owned(), |c| format!("code {c}"))
}

/// Result type for delegate operations.
pub type DelegateResult<T> = Result<T, DelegateError>;
