//! SCM operation error types.

use thiserror::Error;
use userspace_delegate::DelegateError;
use userspace_protocol::ProtocolError;

/// Errors surfaced to the host by SCM operations.
///
/// Nothing here is retried internally. Retry policy, if any, belongs to the
/// host's build execution layer.
#[derive(Debug, Error)]
pub enum ScmError {
    /// The delegate reply did not match the expected grammar.
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolError),

    /// The delegate could not be started or exited unsuccessfully.
    #[error("delegate execution failed: {0}")]
    DelegateExecution(#[source] DelegateError),

    /// The caller broke an operation precondition.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// The build or poll was interrupted while the delegate was running.
    #[error("operation cancelled while the delegate was running")]
    Cancelled,

    /// The host handed over a revision state this SCM did not produce.
    #[error("unsupported revision state type: {type_name}")]
    UnsupportedRevisionState {
        /// Type name reported by the host.
        type_name: String,
    },

    /// The changelog could not be written to its destination.
    #[error("failed to write changelog to {path}: {source}")]
    ChangelogWrite {
        /// Destination path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A persisted changelog does not follow the entry grammar.
    #[error("malformed changelog at line {line}: {message}")]
    MalformedChangelog {
        /// One-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// No SCM is registered under the requested scheme.
    #[error("unknown SCM scheme: {0}")]
    UnknownScheme(String),

    /// The revision store failed.
    #[error("revision store error: {0}")]
    Store(String),
}

impl From<DelegateError> for ScmError {
    fn from(err: DelegateError) -> Self {
        match err {
            DelegateError::Cancelled => Self::Cancelled,
            other => Self::DelegateExecution(other),
        }
    }
}

/// Result type for SCM operations.
pub type ScmResult<T> = Result<T, ScmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_delegate_maps_to_cancelled() {
        assert!(matches!(
            ScmError::from(DelegateError::Cancelled),
            ScmError::Cancelled
        ));
    }

    #[test]
    fn test_failed_delegate_keeps_diagnostics() {
        let err = ScmError::from(DelegateError::Failed {
            command: "identify".to_owned(),
            exit_code: Some(1),
            stderr: "repository not found".to_owned(),
        });
        assert!(matches!(err, ScmError::DelegateExecution(_)));
        assert!(err.to_string().contains("repository not found"));
    }
}
