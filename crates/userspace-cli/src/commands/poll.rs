//! Poll command: ask the delegate whether the head moved.

use std::path::Path;

use anyhow::{Result, bail};
use tracing::{Instrument, info};
use userspace_protocol::{BaselineState, PollingDecision, RevisionState};
use userspace_scm::{JobContext, RevisionStore};

use super::Host;
use crate::formatter;

/// Where the poll baseline comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Since {
    /// The state saved for an earlier build.
    Build(String),
    /// A revision token given directly.
    Revision(String),
}

async fn resolve_baseline(host: &Host, since: &Since) -> Result<BaselineState> {
    match since {
        Since::Build(build_id) => match host.store.load(build_id).await? {
            Some(state) => Ok(state),
            None => bail!("no revision state recorded for build {build_id}"),
        },
        Since::Revision(token) => Ok(BaselineState::from(RevisionState::new(token.as_str()))),
    }
}

/// Poll `job` against the baseline and print the decision.
pub(crate) async fn run_poll(
    host: &Host,
    job_name: &str,
    workspace: Option<&Path>,
    since: &Since,
) -> Result<PollingDecision> {
    let op = host.operation("poll").with_job(job_name);
    let span = op.span();

    let decision = async {
        let baseline = resolve_baseline(host, since).await?;
        let job = JobContext::new(job_name).with_cancellation(host.cancel.clone());
        let decision = host.scm.poll(&job, workspace, &baseline).await?;
        info!(
            change = decision.change().as_str(),
            elapsed_ms = op.elapsed_ms(),
            "polled"
        );
        Ok::<_, anyhow::Error>(decision)
    }
    .instrument(span)
    .await?;

    formatter::print_decision(host.format, job_name, &decision)?;
    Ok(decision)
}
