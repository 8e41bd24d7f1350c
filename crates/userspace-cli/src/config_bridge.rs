//! Bridge from `userspace_config::Config` to domain types.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;
use userspace_config::{BackendKind, Config};
use userspace_delegate::{ContainerBackend, ContainerSpec, DockerBackend, LocalProcessBackend};
use userspace_scm::{FileRevisionStore, PinnedRevision, PollingMode, ScmSettings};
use userspace_telemetry::{LogConfig, LogFormat};

/// Convert the `[logging]` section, applying `-v` flags on top.
pub(crate) fn to_log_config(cfg: &Config, verbose: u8) -> LogConfig {
    let format = match cfg.logging.format.as_str() {
        "pretty" => LogFormat::Pretty,
        "json" => LogFormat::Json,
        "full" => LogFormat::Full,
        _ => LogFormat::Compact,
    };

    let mut log_config = LogConfig::new(&cfg.logging.level)
        .with_format(format)
        .with_verbosity(verbose);

    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }

    if let Some(dir) = &cfg.logging.directory {
        log_config = log_config.with_file_logging(dir);
    }

    log_config
}

/// Convert the `[scm]` and `[browser]` sections.
pub(crate) fn to_scm_settings(cfg: &Config) -> Result<ScmSettings> {
    let container = ContainerSpec::new(&cfg.scm.image).with_config(&cfg.scm.config);

    let browser_base = cfg
        .browser
        .base_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("browser.base_url is not a valid URL")?;

    Ok(ScmSettings::new(container, &cfg.scm.head)
        .with_pinned(PinnedRevision::from_config(cfg.scm.pinned_revision()))
        .with_polling(PollingMode::from_flag(
            cfg.scm.requires_workspace_for_polling,
        ))
        .with_browser_base(browser_base))
}

/// Build the configured container backend.
pub(crate) fn to_backend(cfg: &Config) -> Arc<dyn ContainerBackend> {
    let timeout = cfg.backend.timeout_secs.map(Duration::from_secs);
    match cfg.backend.kind {
        BackendKind::Docker => Arc::new(
            DockerBackend::new()
                .with_program(&cfg.backend.program)
                .with_run_args(cfg.backend.extra_args.clone())
                .with_timeout(timeout),
        ),
        BackendKind::Local => Arc::new(
            LocalProcessBackend::new()
                .with_args(cfg.backend.extra_args.clone())
                .with_timeout(timeout),
        ),
    }
}

/// Open the revision store under the configured state directory.
pub(crate) fn to_revision_store(cfg: &Config) -> Result<FileRevisionStore> {
    let directory = cfg
        .state_directory()
        .context("could not determine the state directory")?;
    Ok(FileRevisionStore::new(directory))
}
