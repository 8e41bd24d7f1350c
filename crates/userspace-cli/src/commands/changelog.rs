//! Changelog and browser commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use url::Url;
use userspace_scm::{ChangeLogSet, RawParser};

use super::Host;
use crate::formatter;

/// Parse a changelog file written by `checkout` and print it.
///
/// With `raw` the whole file is shown as one entry instead of being parsed.
pub(crate) async fn run_changelog(
    host: &Host,
    path: &Path,
    build_id: &str,
    raw: bool,
) -> Result<ChangeLogSet> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read changelog {}", path.display()))?;

    let changes = if raw {
        host.scm
            .clone()
            .with_changelog_parser(Arc::new(RawParser))
            .parse_changelog(build_id, &bytes)?
    } else {
        host.scm.parse_changelog(build_id, &bytes)?
    };

    formatter::print_changelog(host.format, &changes, &host.scm.guess_browser())?;
    Ok(changes)
}

/// Print the browser link for `revision`.
pub(crate) fn run_browse(host: &Host, revision: &str) -> Result<Url> {
    let url = host
        .scm
        .guess_browser()
        .revision_url(revision)
        .context("no repository browser configured (set browser.base_url)")?;
    formatter::print_value(host.format, "url", url.as_str())?;
    Ok(url)
}
