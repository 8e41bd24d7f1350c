//! Userspace Protocol - the wire contract between the SCM core and a delegate.
//!
//! A delegate is a containerized program that implements real VCS semantics.
//! The core never speaks git or SVN; it sends a [`Command`] (a verb plus named
//! arguments) and parses the delegate's stdout back into typed values.
//!
//! # Wire format
//!
//! A command is an ordered, even-length list of `NAME VALUE` pairs with
//! `COMMAND` always first. Absent arguments are omitted entirely:
//!
//! ```text
//! COMMAND   checkout|identify|compare
//! HEAD      <head>
//! REVISION  <pinned revision>
//! BASELINE  <baseline revision token>
//! CHANGELOG true|false
//! ```
//!
//! # Replies
//!
//! - `identify` -> one trimmed token, see [`decode_identify`]
//! - `compare` -> `<CHANGE_KIND>\n<TOKEN>`, see [`decode_compare`]
//! - `checkout` -> changelog bytes or nothing, see [`decode_changelog`] and
//!   [`expect_empty`]
//!
//! # Example
//!
//! ```rust
//! use userspace_protocol::{ArgName, ChangeKind, Command, Verb, decode_compare};
//!
//! let command = Command::new(Verb::Compare)
//!     .arg(ArgName::Head, Some("main"))
//!     .arg(ArgName::Revision, None::<String>);
//! assert_eq!(command.encode(), vec!["COMMAND", "compare", "HEAD", "main"]);
//!
//! let (kind, latest) = decode_compare(b"SIGNIFICANT\nabc123").unwrap();
//! assert_eq!(kind, ChangeKind::Significant);
//! assert_eq!(latest.data(), "abc123");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod command;
pub mod error;
pub mod reply;
pub mod revision;

pub use command::{ArgName, Command, Verb};
pub use error::{ProtocolError, ProtocolResult};
pub use reply::{decode_changelog, decode_compare, decode_identify, expect_empty};
pub use revision::{BaselineState, ChangeKind, PollingDecision, RevisionState};
