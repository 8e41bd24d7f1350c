//! Userspace SCM - source control operations delegated to a container.
//!
//! The core knows nothing about git, SVN or any other VCS. It turns host
//! operations into protocol commands, runs them through a delegate, and
//! decodes the replies:
//!
//! - [`UserspaceScm::checkout`] populates a workspace and optionally records
//!   a changelog
//! - [`UserspaceScm::compute_revision_state`] identifies the built revision
//! - [`UserspaceScm::poll`] asks whether the head moved since a baseline
//! - [`UserspaceScm::parse_changelog`] turns a recorded changelog into entries
//! - [`scm_identity_key`] names a configuration for equivalence checks
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use userspace_delegate::{ContainerSpec, DockerBackend};
//! use userspace_scm::prelude::*;
//!
//! # async fn example() -> ScmResult<()> {
//! let settings = ScmSettings::new(ContainerSpec::new("registry.example/git:1"), "main");
//! let scm = UserspaceScm::new(settings, Arc::new(DockerBackend::new()));
//!
//! let build = BuildContext::new("build-1", "/tmp/workspace");
//! scm.checkout(&build, None, None).await?;
//! let state = scm.compute_revision_state(&build).await?;
//!
//! let decision = scm
//!     .poll(&JobContext::new("job"), None, &state.into())
//!     .await?;
//! println!("changes: {}", decision.has_changes());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod browser;
pub mod changelog;
pub mod context;
pub mod error;
pub mod key;
pub mod orchestrator;
pub mod registry;
pub mod settings;
pub mod store;

pub use browser::RepositoryBrowser;
pub use changelog::{ChangeEntry, ChangeLogSet, ChangelogParser, HeaderBlockParser, RawParser};
pub use context::{BuildContext, JobContext};
pub use error::{ScmError, ScmResult};
pub use key::scm_identity_key;
pub use orchestrator::UserspaceScm;
pub use registry::{ScmDescriptor, ScmFactory, ScmRegistry};
pub use settings::{PinnedRevision, PollingMode, ScmSettings};
pub use store::{FileRevisionStore, InMemoryRevisionStore, RevisionStore};

/// Scheme name the SCM registers under.
pub const SCHEME: &str = "userspace";

/// Name shown to users.
pub const DISPLAY_NAME: &str = "Userspace";
