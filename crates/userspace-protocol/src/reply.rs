//! Decoding of delegate stdout into typed results.
//!
//! All functions here are pure. Malformed replies are always an error; a
//! `compare` reply that cannot be parsed never degrades to "no change".

use tracing::debug;

use crate::command::Verb;
use crate::error::{ProtocolError, ProtocolResult};
use crate::revision::{ChangeKind, RevisionState};

fn as_text(raw: &[u8]) -> ProtocolResult<&str> {
    std::str::from_utf8(raw).map_err(|e| ProtocolError::InvalidUtf8(e.to_string()))
}

/// Decode an `identify` reply: the whole output, trimmed, is the new token.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidUtf8`] if the reply is not UTF-8.
pub fn decode_identify(raw: &[u8]) -> ProtocolResult<RevisionState> {
    let token = as_text(raw)?.trim();
    debug!(token = %token, "decoded identify reply");
    Ok(RevisionState::new(token))
}

/// Decode a `compare` reply of the form `<CHANGE_KIND>\n<TOKEN>`.
///
/// The split happens at the first newline. The change kind must match exactly.
/// The token is the remainder trimmed the same way as an `identify` reply, so
/// both commands yield equal tokens for the same revision. It may be empty when
/// the delegate knows no revision.
///
/// # Errors
///
/// Returns [`ProtocolError::MissingSeparator`] if there is no newline,
/// [`ProtocolError::UnknownChangeKind`] if the first line is not a known kind,
/// or [`ProtocolError::InvalidUtf8`].
pub fn decode_compare(raw: &[u8]) -> ProtocolResult<(ChangeKind, RevisionState)> {
    let text = as_text(raw)?;
    let Some((kind, token)) = text.split_once('\n') else {
        return Err(ProtocolError::MissingSeparator {
            reply: text.to_owned(),
        });
    };

    let kind: ChangeKind = kind.parse()?;
    let token = token.trim();
    debug!(change = %kind, token = %token, "decoded compare reply");
    Ok((kind, RevisionState::new(token)))
}

/// Decode a `checkout` reply when a changelog was requested.
///
/// The output is passed through verbatim.
#[must_use]
pub fn decode_changelog(raw: &[u8]) -> &[u8] {
    raw
}

/// Require that a command produced no output at all.
///
/// # Errors
///
/// Returns [`ProtocolError::UnexpectedOutput`] carrying the (lossily decoded)
/// output if anything was printed.
pub fn expect_empty(verb: &Verb, raw: &[u8]) -> ProtocolResult<()> {
    if raw.is_empty() {
        return Ok(());
    }
    Err(ProtocolError::UnexpectedOutput {
        command: verb.to_string(),
        output: String::from_utf8_lossy(raw).into_owned(),
    })
}
