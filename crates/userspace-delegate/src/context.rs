//! Execution contexts a delegate can run in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Where and with which environment a delegate command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A build workspace owned by the host.
    Workspace {
        /// Workspace root, mounted or used as the working directory.
        root: PathBuf,
        /// Environment inherited from the build.
        env: BTreeMap<String, String>,
    },
    /// Lightweight local-only context with no workspace.
    Local {
        /// Environment inherited from the job.
        env: BTreeMap<String, String>,
    },
}

impl ExecutionContext {
    /// Context rooted at a workspace directory.
    #[must_use]
    pub fn workspace(root: impl Into<PathBuf>) -> Self {
        Self::Workspace {
            root: root.into(),
            env: BTreeMap::new(),
        }
    }

    /// Workspace-free context.
    #[must_use]
    pub fn local() -> Self {
        Self::Local {
            env: BTreeMap::new(),
        }
    }

    /// Add an environment variable for the backend process.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (Self::Workspace { env, .. } | Self::Local { env }) = &mut self;
        env.insert(key.into(), value.into());
        self
    }

    /// Replace the environment wholesale.
    #[must_use]
    pub fn with_envs(mut self, vars: BTreeMap<String, String>) -> Self {
        let (Self::Workspace { env, .. } | Self::Local { env }) = &mut self;
        *env = vars;
        self
    }

    /// Workspace root, if this context has one.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        match self {
            Self::Workspace { root, .. } => Some(root),
            Self::Local { .. } => None,
        }
    }

    /// Environment for the backend process.
    #[must_use]
    pub fn env(&self) -> &BTreeMap<String, String> {
        let (Self::Workspace { env, .. } | Self::Local { env }) = self;
        env
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workspace { .. } => "workspace",
            Self::Local { .. } => "local",
        }
    }
}
