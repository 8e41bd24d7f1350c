//! Build-side commands: checkout and identify.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{Instrument, info, warn};
use userspace_protocol::{BaselineState, RevisionState};
use userspace_scm::{BuildContext, RevisionStore};

use super::Host;
use crate::formatter;

fn build_context(host: &Host, build_id: &str, workspace: &Path) -> BuildContext {
    BuildContext::new(build_id, workspace).with_cancellation(host.cancel.clone())
}

/// Check out the head for `build_id`, record its revision and print it.
///
/// `baseline_build` names an earlier build whose saved state is sent as the
/// baseline so the delegate can compute the changelog since then.
pub(crate) async fn run_checkout(
    host: &Host,
    build_id: &str,
    workspace: &Path,
    changelog: Option<&Path>,
    baseline_build: Option<&str>,
) -> Result<RevisionState> {
    let op = host.operation("checkout").with_build_id(build_id);
    let span = op.span();

    let state = async {
        let baseline = match baseline_build {
            Some(previous) => {
                let loaded = host.store.load(previous).await?;
                if loaded.is_none() {
                    warn!(build_id = previous, "no saved revision for baseline build");
                }
                loaded
            },
            None => None,
        };

        tokio::fs::create_dir_all(workspace)
            .await
            .with_context(|| format!("failed to create workspace {}", workspace.display()))?;

        let build = build_context(host, build_id, workspace);
        host.scm
            .checkout(&build, baseline.as_ref(), changelog)
            .await?;
        let state = host.scm.compute_revision_state(&build).await?;
        host.store
            .save(build_id, &BaselineState::from(state.clone()))
            .await?;

        info!(revision = %state, elapsed_ms = op.elapsed_ms(), "build recorded");
        Ok::<_, anyhow::Error>(state)
    }
    .instrument(span)
    .await?;

    formatter::print_revision(host.format, build_id, &state, changelog)?;
    Ok(state)
}

/// Identify the revision in `workspace`, optionally saving it for
/// `build_id`.
pub(crate) async fn run_identify(
    host: &Host,
    build_id: &str,
    workspace: &Path,
    save: bool,
) -> Result<RevisionState> {
    let op = host.operation("identify").with_build_id(build_id);
    let span = op.span();

    let state = async {
        let build = build_context(host, build_id, workspace);
        let state = host.scm.compute_revision_state(&build).await?;
        if save {
            host.store
                .save(build_id, &BaselineState::from(state.clone()))
                .await?;
        }
        info!(revision = %state, saved = save, elapsed_ms = op.elapsed_ms(), "identified");
        Ok::<_, anyhow::Error>(state)
    }
    .instrument(span)
    .await?;

    formatter::print_revision(host.format, build_id, &state, None)?;
    Ok(state)
}
