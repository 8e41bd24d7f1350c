//! Prelude module - commonly used test helpers.

pub use crate::init_test_logging;
pub use crate::{Invocation, ScriptedBackend, ScriptedReply};
pub use crate::{compare_reply, test_container_spec};
