//! Configuration types for the userspace SCM.
//!
//! These types mirror the domain settings without depending on the other
//! userspace crates; the CLI converts them at startup. Every struct
//! implements [`Default`] so a bare `[section]` header is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delegate and head selection.
    pub scm: ScmSection,
    /// How the delegate is executed.
    pub backend: BackendSection,
    /// Repository browser links.
    pub browser: BrowserSection,
    /// Logging level, format and per-crate directives.
    pub logging: LoggingSection,
    /// Where revision states are persisted between builds.
    pub state: StateSection,
}

// ---------------------------------------------------------------------------
// ScmSection
// ---------------------------------------------------------------------------

/// Which delegate to run and what it should track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScmSection {
    /// Delegate image reference (or executable for the local backend).
    pub image: String,
    /// Opaque delegate configuration, piped to it on stdin.
    pub config: String,
    /// Branch or ref of interest.
    pub head: String,
    /// Pinned revision. Empty or whitespace means "not pinned".
    pub revision: String,
    /// Whether polling needs a workspace.
    pub requires_workspace_for_polling: bool,
}

impl Default for ScmSection {
    fn default() -> Self {
        Self {
            image: String::new(),
            config: String::new(),
            head: "main".to_owned(),
            revision: String::new(),
            requires_workspace_for_polling: false,
        }
    }
}

impl ScmSection {
    /// The pinned revision, or `None` when the field is blank.
    #[must_use]
    pub fn pinned_revision(&self) -> Option<&str> {
        let trimmed = self.revision.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

// ---------------------------------------------------------------------------
// BackendSection
// ---------------------------------------------------------------------------

/// Container backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `docker run` (or a compatible CLI such as podman).
    #[default]
    Docker,
    /// Run the image as a local executable.
    Local,
}

/// How delegate invocations are executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Backend kind.
    pub kind: BackendKind,
    /// Container CLI for the docker backend (`docker`, `podman`, ...).
    pub program: String,
    /// Extra arguments: `docker run` flags, or arguments to the local
    /// executable.
    pub extra_args: Vec<String>,
    /// Kill the delegate after this many seconds. Unset means no limit.
    pub timeout_secs: Option<u64>,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            kind: BackendKind::Docker,
            program: "docker".to_owned(),
            extra_args: Vec::new(),
            timeout_secs: None,
        }
    }
}

// ---------------------------------------------------------------------------
// BrowserSection
// ---------------------------------------------------------------------------

/// Repository browser configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    /// Base URL links are built under. Unset disables links.
    pub base_url: Option<String>,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate directives (e.g. `["userspace_delegate=debug"]`).
    pub directives: Vec<String>,
    /// Write rolling log files here instead of stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}

// ---------------------------------------------------------------------------
// StateSection
// ---------------------------------------------------------------------------

/// Revision state persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSection {
    /// Directory for per-build state files. `None` uses the platform data
    /// directory.
    pub directory: Option<PathBuf>,
}
