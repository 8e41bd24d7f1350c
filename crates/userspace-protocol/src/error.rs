//! Protocol error types.

use thiserror::Error;

/// A delegate reply or command list that does not match the wire grammar.
///
/// Every variant aborts the current operation. None of them is ever coerced
/// into a default value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A `compare` reply had no newline between change kind and token.
    #[error("compare reply has no newline separator: {reply:?}")]
    MissingSeparator {
        /// The full reply as received.
        reply: String,
    },

    /// A `compare` reply started with a token that is not a known change kind.
    #[error("unknown change kind {token:?} (expected NONE, INCOMPARABLE or SIGNIFICANT)")]
    UnknownChangeKind {
        /// The offending token.
        token: String,
    },

    /// The delegate printed output where none was expected.
    #[error("unexpected delegate output for {command}: {output:?}")]
    UnexpectedOutput {
        /// Verb of the command that produced the output.
        command: String,
        /// The output that was not expected.
        output: String,
    },

    /// The reply was not valid UTF-8.
    #[error("delegate reply is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    /// A wire argument list had an odd number of entries.
    #[error("argument list has odd length {0}")]
    OddArgumentCount(usize),

    /// A wire argument name is not on the allow-list.
    #[error("unknown argument name {0:?}")]
    UnknownArgument(String),

    /// A wire argument list did not start with `COMMAND`.
    #[error("argument list must start with COMMAND")]
    MissingCommand,

    /// A wire argument appeared more than once.
    #[error("duplicate argument {0}")]
    DuplicateArgument(String),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
