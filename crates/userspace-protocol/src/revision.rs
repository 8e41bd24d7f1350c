//! Revision state tokens and polling decisions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Opaque token describing where the source was at a point in time.
///
/// Two states are equal iff their tokens are byte-equal. The token is produced
/// by the delegate and never interpreted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionState {
    data: String,
}

impl RevisionState {
    /// Wrap a delegate-produced token.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// The raw token.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Whether the delegate reported "no revision known".
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume and return the token.
    #[must_use]
    pub fn into_data(self) -> String {
        self.data
    }
}

impl fmt::Display for RevisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

/// A baseline handed back by the host.
///
/// Hosts may store revision states from other SCM implementations. Only
/// [`BaselineState::Token`] is meaningful to this core; the other variant
/// carries the foreign type name so callers can report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaselineState {
    /// A token produced by a userspace delegate.
    Token {
        /// The wrapped revision state.
        #[serde(flatten)]
        state: RevisionState,
    },
    /// A state produced by some other SCM implementation.
    Foreign {
        /// Type name reported by the host.
        type_name: String,
    },
}

impl BaselineState {
    /// The userspace token, if this baseline is one.
    #[must_use]
    pub fn as_token(&self) -> Option<&RevisionState> {
        match self {
            Self::Token { state } => Some(state),
            Self::Foreign { .. } => None,
        }
    }
}

impl From<RevisionState> for BaselineState {
    fn from(state: RevisionState) -> Self {
        Self::Token { state }
    }
}

/// How significant the difference between baseline and latest is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    /// Nothing changed.
    None,
    /// The states cannot be compared, so a build is warranted.
    Incomparable,
    /// A change that should trigger a build.
    Significant,
}

impl ChangeKind {
    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Incomparable => "INCOMPARABLE",
            Self::Significant => "SIGNIFICANT",
        }
    }

    /// Whether the host should schedule a build.
    #[must_use]
    pub const fn has_changes(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl FromStr for ChangeKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::None),
            "INCOMPARABLE" => Ok(Self::Incomparable),
            "SIGNIFICANT" => Ok(Self::Significant),
            other => Err(ProtocolError::UnknownChangeKind {
                token: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one poll. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingDecision {
    baseline: RevisionState,
    latest: RevisionState,
    change: ChangeKind,
}

impl PollingDecision {
    /// Assemble a decision.
    #[must_use]
    pub fn new(baseline: RevisionState, latest: RevisionState, change: ChangeKind) -> Self {
        Self {
            baseline,
            latest,
            change,
        }
    }

    /// The state polled against.
    #[must_use]
    pub fn baseline(&self) -> &RevisionState {
        &self.baseline
    }

    /// The state the delegate reported as current.
    #[must_use]
    pub fn latest(&self) -> &RevisionState {
        &self.latest
    }

    /// Delegate-reported change classification.
    #[must_use]
    pub fn change(&self) -> ChangeKind {
        self.change
    }

    /// Shorthand for `change().has_changes()`.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.change.has_changes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_byte_equality() {
        assert_eq!(RevisionState::new("abc"), RevisionState::new("abc"));
        assert_ne!(RevisionState::new("abc"), RevisionState::new("abc "));
        assert_ne!(RevisionState::new("abc"), RevisionState::new("ABC"));
    }

    #[test]
    fn test_change_kind_parse_is_case_sensitive() {
        assert_eq!("NONE".parse::<ChangeKind>().unwrap(), ChangeKind::None);
        assert_eq!(
            "INCOMPARABLE".parse::<ChangeKind>().unwrap(),
            ChangeKind::Incomparable
        );
        assert!("significant".parse::<ChangeKind>().is_err());
        assert!(" NONE".parse::<ChangeKind>().is_err());
    }

    #[test]
    fn test_has_changes() {
        assert!(!ChangeKind::None.has_changes());
        assert!(ChangeKind::Incomparable.has_changes());
        assert!(ChangeKind::Significant.has_changes());
    }

    #[test]
    fn test_baseline_serialization_is_tagged() {
        let baseline = BaselineState::from(RevisionState::new("deadbeef"));
        let json = serde_json::to_string(&baseline).unwrap();
        assert_eq!(json, r#"{"kind":"token","data":"deadbeef"}"#);

        let foreign: BaselineState =
            serde_json::from_str(r#"{"kind":"foreign","type_name":"GitRevision"}"#).unwrap();
        assert!(foreign.as_token().is_none());
    }
}
