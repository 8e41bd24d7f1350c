//! Prelude module - commonly used types for convenient import.
//!
//! Use `use userspace_scm::prelude::*;` to import all essential types.

// Orchestration
pub use crate::{BuildContext, JobContext, UserspaceScm};

// Settings
pub use crate::{PinnedRevision, PollingMode, ScmSettings};

// Changelogs and links
pub use crate::{ChangeEntry, ChangeLogSet, ChangelogParser, RepositoryBrowser};

// Persistence
pub use crate::{FileRevisionStore, InMemoryRevisionStore, RevisionStore};

// Registry
pub use crate::{ScmRegistry, scm_identity_key};

// Errors
pub use crate::{ScmError, ScmResult};

// Protocol types that cross the host boundary
pub use userspace_protocol::{BaselineState, ChangeKind, PollingDecision, RevisionState};
