//! Rendering command results as text or JSON.

use std::path::Path;

use serde::Serialize;
use userspace_protocol::{PollingDecision, RevisionState};
use userspace_scm::{ChangeLogSet, RepositoryBrowser};

use crate::theme::Theme;

/// How results are printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Colored text for terminals.
    Pretty,
    /// One JSON document per command.
    Json,
}

#[derive(Serialize)]
struct RevisionReport<'a> {
    build_id: &'a str,
    revision: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    changelog: Option<String>,
}

#[derive(Serialize)]
struct PollReport<'a> {
    job: &'a str,
    baseline: &'a str,
    latest: &'a str,
    change: &'static str,
    has_changes: bool,
}

#[derive(Serialize)]
struct ChangeReport<'a> {
    #[serde(flatten)]
    entry: &'a userspace_scm::ChangeEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Serialize)]
struct ChangelogReport<'a> {
    build_id: &'a str,
    entries: Vec<ChangeReport<'a>>,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn display_revision(state: &RevisionState) -> String {
    if state.is_unknown() {
        Theme::dimmed("(none)")
    } else {
        state.data().to_owned()
    }
}

/// Print the outcome of a checkout or identify.
pub(crate) fn print_revision(
    format: OutputFormat,
    build_id: &str,
    state: &RevisionState,
    changelog: Option<&Path>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&RevisionReport {
            build_id,
            revision: state.data(),
            changelog: changelog.map(|p| p.display().to_string()),
        }),
        OutputFormat::Pretty => {
            println!("{}", Theme::success(&format!("build {build_id}")));
            println!("{}", Theme::field("revision", &display_revision(state)));
            if let Some(path) = changelog {
                println!("{}", Theme::field("changelog", &path.display().to_string()));
            }
            Ok(())
        },
    }
}

/// Print a polling decision.
pub(crate) fn print_decision(
    format: OutputFormat,
    job: &str,
    decision: &PollingDecision,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&PollReport {
            job,
            baseline: decision.baseline().data(),
            latest: decision.latest().data(),
            change: decision.change().as_str(),
            has_changes: decision.has_changes(),
        }),
        OutputFormat::Pretty => {
            println!("{}", Theme::header(&format!("Poll: {job}")));
            println!("{}", Theme::field("change", &Theme::change_kind(decision.change())));
            println!(
                "{}",
                Theme::field("baseline", &display_revision(decision.baseline()))
            );
            println!(
                "{}",
                Theme::field("latest", &display_revision(decision.latest()))
            );
            Ok(())
        },
    }
}

/// Print a parsed changelog with browser links where available.
pub(crate) fn print_changelog(
    format: OutputFormat,
    changes: &ChangeLogSet,
    browser: &RepositoryBrowser,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&ChangelogReport {
            build_id: &changes.build_id,
            entries: changes
                .iter()
                .map(|entry| ChangeReport {
                    entry,
                    url: browser.change_url(entry).map(String::from),
                })
                .collect(),
        }),
        OutputFormat::Pretty => {
            println!(
                "{}",
                Theme::header(&format!("Changes in {}", changes.build_id))
            );
            if changes.is_empty() {
                println!("{}", Theme::info("no changes recorded"));
                return Ok(());
            }
            for entry in changes {
                println!("{}", Theme::separator());
                if let Some(revision) = &entry.revision {
                    println!("{}", Theme::field("revision", revision));
                }
                if let Some(author) = &entry.author {
                    println!("{}", Theme::field("author", author));
                }
                if let Some(timestamp) = &entry.timestamp {
                    println!("{}", Theme::field("date", &timestamp.to_rfc3339()));
                }
                if let Some(url) = browser.change_url(entry) {
                    println!("{}", Theme::field("link", url.as_str()));
                }
                for line in entry.message.lines() {
                    println!("    {line}");
                }
            }
            Ok(())
        },
    }
}

/// Print a single value, such as a key or URL.
pub(crate) fn print_value(format: OutputFormat, name: &str, value: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let mut object = serde_json::Map::new();
            object.insert(name.to_owned(), serde_json::Value::from(value));
            print_json(&object)
        },
        OutputFormat::Pretty => {
            println!("{value}");
            Ok(())
        },
    }
}
