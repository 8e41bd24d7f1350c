//! Immutable per-job SCM settings.

use url::Url;
use userspace_delegate::ContainerSpec;
use userspace_protocol::RevisionState;

/// A revision pinned by configuration, or none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PinnedRevision {
    /// Follow the head.
    #[default]
    Unpinned,
    /// Always build this revision.
    Pinned(RevisionState),
}

impl PinnedRevision {
    /// Build from a configured value. Blank strings mean "not pinned".
    #[must_use]
    pub fn from_config(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self::Pinned(RevisionState::new(v)),
            _ => Self::Unpinned,
        }
    }

    /// The pinned state, if any.
    #[must_use]
    pub fn state(&self) -> Option<&RevisionState> {
        match self {
            Self::Pinned(state) => Some(state),
            Self::Unpinned => None,
        }
    }

    /// The pinned token, if any, as sent in `REVISION`.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.state().map(RevisionState::data)
    }
}

/// Execution discipline for polling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollingMode {
    /// Poll in a lightweight local context. Callers must not supply a workspace.
    #[default]
    WorkspaceFree,
    /// Poll inside a workspace the caller supplies.
    WorkspaceRequired,
}

impl PollingMode {
    /// Map the host's boolean flag.
    #[must_use]
    pub fn from_flag(requires_workspace: bool) -> Self {
        if requires_workspace {
            Self::WorkspaceRequired
        } else {
            Self::WorkspaceFree
        }
    }

    /// Whether a workspace must be supplied.
    #[must_use]
    pub fn requires_workspace(self) -> bool {
        matches!(self, Self::WorkspaceRequired)
    }
}

/// Everything one job's SCM needs, assembled once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmSettings {
    /// Delegate image and its opaque config.
    pub container: ContainerSpec,
    /// Branch or ref of interest, passed through unmodified.
    pub head: String,
    /// Configuration-level revision override.
    pub pinned: PinnedRevision,
    /// Polling discipline.
    pub polling: PollingMode,
    /// Base URL for repository browser links.
    pub browser_base: Option<Url>,
}

impl ScmSettings {
    /// Settings following `head` with default polling and no browser.
    #[must_use]
    pub fn new(container: ContainerSpec, head: impl Into<String>) -> Self {
        Self {
            container,
            head: head.into(),
            pinned: PinnedRevision::Unpinned,
            polling: PollingMode::default(),
            browser_base: None,
        }
    }

    /// Pin a revision.
    #[must_use]
    pub fn with_pinned(mut self, pinned: PinnedRevision) -> Self {
        self.pinned = pinned;
        self
    }

    /// Set the polling discipline.
    #[must_use]
    pub fn with_polling(mut self, polling: PollingMode) -> Self {
        self.polling = polling;
        self
    }

    /// Set the repository browser base URL.
    #[must_use]
    pub fn with_browser_base(mut self, base: Option<Url>) -> Self {
        self.browser_base = base;
        self
    }
}
