//! Subcommand implementations.

pub(crate) mod build;
pub(crate) mod changelog;
pub(crate) mod info;
pub(crate) mod poll;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use userspace_config::Config;
use userspace_delegate::ContainerBackend;
use userspace_scm::{FileRevisionStore, SCHEME, ScmRegistry, ScmSettings, UserspaceScm};
use userspace_telemetry::OperationContext;

use crate::config_bridge;
use crate::formatter::OutputFormat;

/// Everything a subcommand needs: the SCM, its state store and the
/// process-wide cancellation token.
pub(crate) struct Host {
    pub(crate) scm: UserspaceScm,
    pub(crate) store: FileRevisionStore,
    pub(crate) backend_name: &'static str,
    pub(crate) cancel: CancellationToken,
    pub(crate) format: OutputFormat,
}

impl Host {
    /// Build the host from loaded configuration.
    pub(crate) fn from_config(
        cfg: &Config,
        cancel: CancellationToken,
        format: OutputFormat,
    ) -> Result<Self> {
        let settings = config_bridge::to_scm_settings(cfg)?;
        let backend = config_bridge::to_backend(cfg);
        let store = config_bridge::to_revision_store(cfg)?;
        Self::new(settings, backend, store, cancel, format)
    }

    pub(crate) fn new(
        settings: ScmSettings,
        backend: Arc<dyn ContainerBackend>,
        store: FileRevisionStore,
        cancel: CancellationToken,
        format: OutputFormat,
    ) -> Result<Self> {
        let backend_name = backend.name();
        let scm = ScmRegistry::builtin().create(SCHEME, settings, backend)?;
        Ok(Self {
            scm,
            store,
            backend_name,
            cancel,
            format,
        })
    }

    /// Operation context tagged with this SCM's identity key.
    pub(crate) fn operation(&self, name: &str) -> OperationContext {
        OperationContext::new(name).with_scm_key(self.scm.key())
    }
}
