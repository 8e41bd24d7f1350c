//! Commands sent to a delegate and their wire encoding.

use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

/// Name of the leading pair that carries the verb.
pub const COMMAND_KEY: &str = "COMMAND";

/// Named operation requested from the delegate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Populate the workspace, optionally emitting a changelog.
    Checkout,
    /// Report the current revision token.
    Identify,
    /// Compare the remote state against a baseline token.
    Compare,
    /// Any verb the core does not know yet.
    Other(String),
}

impl Verb {
    /// Wire spelling of the verb.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Checkout => "checkout",
            Self::Identify => "identify",
            Self::Compare => "compare",
            Self::Other(name) => name,
        }
    }

    /// Parse a wire verb. Unknown verbs are kept as [`Verb::Other`].
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "checkout" => Self::Checkout,
            "identify" => Self::Identify,
            "compare" => Self::Compare,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allow-listed argument names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgName {
    /// Branch or ref of interest.
    Head,
    /// Pinned revision token.
    Revision,
    /// Baseline revision token from a previous build.
    Baseline,
    /// Whether checkout should print a changelog (`true`/`false`).
    Changelog,
}

impl ArgName {
    /// All argument names in canonical order.
    pub const ALL: [Self; 4] = [Self::Head, Self::Revision, Self::Baseline, Self::Changelog];

    /// Wire spelling of the name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Revision => "REVISION",
            Self::Baseline => "BASELINE",
            Self::Changelog => "CHANGELOG",
        }
    }

    /// Look up an allow-listed name. Matching is exact and case-sensitive.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str() == raw)
    }
}

impl fmt::Display for ArgName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verb plus an ordered mapping of argument names to optional values.
///
/// `None` means "argument omitted" and is never sent; `Some("")` is sent as a
/// supplied-but-empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    args: Vec<(ArgName, Option<String>)>,
}

impl Command {
    /// Create a command with no arguments.
    #[must_use]
    pub fn new(verb: Verb) -> Self {
        Self {
            verb,
            args: Vec::new(),
        }
    }

    /// Set an argument. Setting a name twice replaces the value in place.
    #[must_use]
    pub fn arg<V: Into<String>>(mut self, name: ArgName, value: Option<V>) -> Self {
        let value = value.map(Into::into);
        if let Some(slot) = self.args.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.args.push((name, value));
        }
        self
    }

    /// The command verb.
    #[must_use]
    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    /// Value of a supplied argument, if any.
    #[must_use]
    pub fn get(&self, name: ArgName) -> Option<&str> {
        self.args
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Supplied arguments in insertion order, absent ones skipped.
    pub fn supplied(&self) -> impl Iterator<Item = (ArgName, &str)> {
        self.args
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (*name, v)))
    }

    /// Encode to the wire list: `COMMAND <verb>` followed by every supplied pair.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        let mut wire = vec![COMMAND_KEY.to_owned(), self.verb.as_str().to_owned()];
        for (name, value) in self.supplied() {
            wire.push(name.as_str().to_owned());
            wire.push(value.to_owned());
        }
        wire
    }

    /// Supplied pairs as `(NAME, VALUE)` with `COMMAND` first.
    ///
    /// Backends that pass arguments as environment variables use this form.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = vec![(COMMAND_KEY, self.verb.as_str())];
        pairs.extend(self.supplied().map(|(name, value)| (name.as_str(), value)));
        pairs
    }

    /// Decode a wire list produced by [`Command::encode`].
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if the list has odd length, does not start
    /// with `COMMAND`, or names an argument outside the allow-list.
    pub fn decode_wire<S: AsRef<str>>(wire: &[S]) -> ProtocolResult<Self> {
        if !wire.len().is_multiple_of(2) {
            return Err(ProtocolError::OddArgumentCount(wire.len()));
        }

        let mut pairs = wire.chunks_exact(2).map(|pair| (pair[0].as_ref(), pair[1].as_ref()));

        let verb = match pairs.next() {
            Some((COMMAND_KEY, verb)) => Verb::from_wire(verb),
            _ => return Err(ProtocolError::MissingCommand),
        };

        let mut command = Self::new(verb);
        for (raw_name, value) in pairs {
            let name = ArgName::from_wire(raw_name)
                .ok_or_else(|| ProtocolError::UnknownArgument(raw_name.to_owned()))?;
            if command.get(name).is_some() {
                return Err(ProtocolError::DuplicateArgument(raw_name.to_owned()));
            }
            command = command.arg(name, Some(value));
        }
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout() -> Command {
        Command::new(Verb::Checkout)
            .arg(ArgName::Head, Some("main"))
            .arg(ArgName::Revision, None::<String>)
            .arg(ArgName::Baseline, Some("abc"))
            .arg(ArgName::Changelog, Some("true"))
    }

    #[test]
    fn test_encode_puts_command_first_and_skips_absent() {
        assert_eq!(
            checkout().encode(),
            vec![
                "COMMAND",
                "checkout",
                "HEAD",
                "main",
                "BASELINE",
                "abc",
                "CHANGELOG",
                "true"
            ]
        );
    }

    #[test]
    fn test_empty_value_is_sent() {
        let command = Command::new(Verb::Compare).arg(ArgName::Baseline, Some(""));
        assert_eq!(command.encode(), vec!["COMMAND", "compare", "BASELINE", ""]);
    }

    #[test]
    fn test_identify_has_only_command() {
        assert_eq!(
            Command::new(Verb::Identify).encode(),
            vec!["COMMAND", "identify"]
        );
    }

    #[test]
    fn test_decode_recovers_supplied_arguments() {
        let original = checkout();
        let decoded = Command::decode_wire(&original.encode()).unwrap();

        assert_eq!(decoded.verb(), &Verb::Checkout);
        assert_eq!(decoded.get(ArgName::Head), Some("main"));
        assert_eq!(decoded.get(ArgName::Revision), None);
        assert_eq!(decoded.get(ArgName::Baseline), Some("abc"));
        assert_eq!(decoded.get(ArgName::Changelog), Some("true"));
        assert_eq!(
            decoded.supplied().collect::<Vec<_>>(),
            original.supplied().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_decode_rejects_odd_length() {
        let err = Command::decode_wire(&["COMMAND", "identify", "HEAD"]).unwrap_err();
        assert_eq!(err, ProtocolError::OddArgumentCount(3));
    }

    #[test]
    fn test_decode_rejects_unknown_name() {
        let err = Command::decode_wire(&["COMMAND", "identify", "head", "main"]).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownArgument("head".to_owned()));
    }

    #[test]
    fn test_decode_requires_command_first() {
        let err = Command::decode_wire(&["HEAD", "main", "COMMAND", "identify"]).unwrap_err();
        assert_eq!(err, ProtocolError::MissingCommand);
    }

    #[test]
    fn test_decode_rejects_duplicates() {
        let err =
            Command::decode_wire(&["COMMAND", "compare", "HEAD", "a", "HEAD", "b"]).unwrap_err();
        assert_eq!(err, ProtocolError::DuplicateArgument("HEAD".to_owned()));
    }

    #[test]
    fn test_future_verb_round_trips() {
        let decoded = Command::decode_wire(&["COMMAND", "prune"]).unwrap();
        assert_eq!(decoded.verb(), &Verb::Other("prune".to_owned()));
        assert_eq!(decoded.encode(), vec!["COMMAND", "prune"]);
    }

    #[test]
    fn test_arg_replaces_in_place() {
        let command = Command::new(Verb::Compare)
            .arg(ArgName::Head, Some("a"))
            .arg(ArgName::Baseline, Some("x"))
            .arg(ArgName::Head, Some("b"));
        assert_eq!(
            command.pairs(),
            vec![("COMMAND", "compare"), ("HEAD", "b"), ("BASELINE", "x")]
        );
    }
}
