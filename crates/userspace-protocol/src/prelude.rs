//! Prelude module - commonly used types for convenient import.
//!
//! Use `use userspace_protocol::prelude::*;` to import all essential types.

// Commands
pub use crate::{ArgName, Command, Verb};

// Errors
pub use crate::{ProtocolError, ProtocolResult};

// Reply decoding
pub use crate::{decode_changelog, decode_compare, decode_identify, expect_empty};

// Revision state
pub use crate::{BaselineState, ChangeKind, PollingDecision, RevisionState};
