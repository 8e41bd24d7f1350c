//! Host-supplied contexts for builds and polls.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use userspace_delegate::ExecutionContext;

/// One build's view of the SCM: its id, workspace, environment and
/// cancellation signal.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Host identifier for the build.
    pub build_id: String,
    /// Workspace the delegate operates in.
    pub workspace: PathBuf,
    /// Environment inherited from the build.
    pub env: BTreeMap<String, String>,
    /// Fires when the build is aborted.
    pub cancel: CancellationToken,
}

impl BuildContext {
    /// Create a context with an empty environment and a fresh token.
    #[must_use]
    pub fn new(build_id: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            build_id: build_id.into(),
            workspace: workspace.into(),
            env: BTreeMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Tie the build to an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn execution_context(&self) -> ExecutionContext {
        ExecutionContext::workspace(&self.workspace).with_envs(self.env.clone())
    }
}

/// A job being polled, independent of any particular build.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Host identifier for the job.
    pub job_name: String,
    /// Environment inherited from the job.
    pub env: BTreeMap<String, String>,
    /// Fires when the poll is aborted.
    pub cancel: CancellationToken,
}

impl JobContext {
    /// Create a context with an empty environment and a fresh token.
    #[must_use]
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            env: BTreeMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Tie the poll to an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn local_context(&self) -> ExecutionContext {
        ExecutionContext::local().with_envs(self.env.clone())
    }

    pub(crate) fn workspace_context(&self, workspace: &Path) -> ExecutionContext {
        ExecutionContext::workspace(workspace).with_envs(self.env.clone())
    }
}
