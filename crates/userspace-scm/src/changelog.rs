//! Changelog parsing.
//!
//! A checkout that requests a changelog stores the delegate's output verbatim.
//! Turning those bytes into entries is done later by a [`ChangelogParser`].
//!
//! # Default grammar
//!
//! [`HeaderBlockParser`] reads entries separated by lines consisting of
//! `---`. Each entry starts with `Key: value` header lines followed by a blank
//! line, and everything after that is the message:
//!
//! ```text
//! Revision: 4f2a9c1
//! Author: Ada Lovelace <ada@example.com>
//! Date: 2024-03-01T12:00:00Z
//!
//! Fix the analytical engine
//! ---
//! Revision: 77b01de
//!
//! Second change
//! ```
//!
//! `revision`, `author` and `date` (RFC 3339) are recognised case-insensitively.
//! Other headers are kept in [`ChangeEntry::extra`]. The leading lines only
//! count as headers when at least one of them is a recognised key and they are
//! followed by a blank line or the end of the entry. Otherwise the whole entry
//! is message, so a subject such as `Fix: handle empty head` stays intact.

use std::collections::BTreeMap;
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScmError, ScmResult};

/// Line separating entries in the default grammar.
pub const ENTRY_SEPARATOR: &str = "---";

/// One change reported by the delegate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Revision token of the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Author as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// When the change was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form message.
    pub message: String,
    /// Headers the core does not interpret.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ChangeEntry {
    /// Entry holding only a message.
    #[must_use]
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// First line of the message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Parsed changelog of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogSet {
    /// Build the changelog belongs to.
    pub build_id: String,
    /// Entries in delegate order.
    pub entries: Vec<ChangeEntry>,
}

impl ChangeLogSet {
    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ChangeLogSet {
    type Item = &'a ChangeEntry;
    type IntoIter = std::slice::Iter<'a, ChangeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Turns persisted changelog bytes into entries.
pub trait ChangelogParser: Send + Sync + Debug {
    /// Short name for logs and configuration.
    fn name(&self) -> &'static str;

    /// Parse the raw bytes written during checkout.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::MalformedChangelog`] if the bytes break the grammar.
    fn parse(&self, raw: &[u8]) -> ScmResult<Vec<ChangeEntry>>;
}

/// Treats the whole blob as a single entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawParser;

impl ChangelogParser for RawParser {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn parse(&self, raw: &[u8]) -> ScmResult<Vec<ChangeEntry>> {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![ChangeEntry::message_only(text)])
    }
}

/// `Key: value` headers followed by a message, entries split by `---`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderBlockParser;

impl HeaderBlockParser {
    fn header(line: &str) -> Option<(&str, &str)> {
        let (key, value) = line.split_once(':')?;
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| (key, value.trim()))
    }

    fn is_known(key: &str) -> bool {
        ["revision", "author", "date"]
            .iter()
            .any(|known| key.eq_ignore_ascii_case(known))
    }

    /// Number of leading lines that form the header section, zero if none.
    fn header_len(lines: &[(usize, &str)]) -> usize {
        let run = lines
            .iter()
            .take_while(|(_, line)| Self::header(line).is_some())
            .count();
        let closed = lines
            .get(run)
            .is_none_or(|(_, line)| line.trim().is_empty());
        let known = lines
            .iter()
            .take(run)
            .filter_map(|(_, line)| Self::header(line))
            .any(|(key, _)| Self::is_known(key));
        if closed && known { run } else { 0 }
    }

    fn parse_block(lines: &[(usize, &str)]) -> ScmResult<Option<ChangeEntry>> {
        let mut entry = ChangeEntry::default();
        let (headers, rest) = lines.split_at(Self::header_len(lines));

        for (line_no, line) in headers {
            let Some((key, value)) = Self::header(line) else {
                continue;
            };
            match key.to_ascii_lowercase().as_str() {
                "revision" => entry.revision = Some(value.to_owned()),
                "author" => entry.author = Some(value.to_owned()),
                "date" => {
                    let parsed = DateTime::parse_from_rfc3339(value).map_err(|e| {
                        ScmError::MalformedChangelog {
                            line: *line_no,
                            message: format!("invalid date {value:?}: {e}"),
                        }
                    })?;
                    entry.timestamp = Some(parsed.with_timezone(&Utc));
                },
                _ => {
                    entry.extra.insert(key.to_owned(), value.to_owned());
                },
            }
        }

        let message = rest
            .iter()
            .map(|(_, line)| *line)
            .collect::<Vec<_>>()
            .join("\n");
        entry.message = message.trim().to_owned();

        let is_blank = entry.message.is_empty()
            && entry.revision.is_none()
            && entry.author.is_none()
            && entry.timestamp.is_none()
            && entry.extra.is_empty();
        Ok((!is_blank).then_some(entry))
    }
}

impl ChangelogParser for HeaderBlockParser {
    fn name(&self) -> &'static str {
        "header-block"
    }

    fn parse(&self, raw: &[u8]) -> ScmResult<Vec<ChangeEntry>> {
        let text = String::from_utf8_lossy(raw);
        let mut entries = Vec::new();
        let mut block: Vec<(usize, &str)> = Vec::new();

        for (line_no, line) in (1_usize..).zip(text.lines()) {
            if line.trim_end() == ENTRY_SEPARATOR {
                entries.extend(Self::parse_block(&block)?);
                block.clear();
            } else {
                block.push((line_no, line.trim_end_matches('\r')));
            }
        }
        entries.extend(Self::parse_block(&block)?);

        Ok(entries)
    }
}
