//! Descriptive commands: the identity key and a configuration summary.

use anyhow::Result;
use serde::Serialize;
use userspace_scm::DISPLAY_NAME;

use super::Host;
use crate::formatter::{self, OutputFormat};
use crate::theme::Theme;

/// Print the SCM identity key.
pub(crate) fn show_key(host: &Host) -> Result<String> {
    let key = host.scm.key();
    formatter::print_value(host.format, "key", &key)?;
    Ok(key)
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    scm_type: &'static str,
    key: String,
    image: &'a str,
    head: &'a str,
    pinned_revision: Option<&'a str>,
    requires_workspace_for_polling: bool,
    backend: &'static str,
    changelog_parser: &'static str,
    browser: Option<&'a str>,
    state_directory: String,
    config_files: &'a [String],
}

/// Print what the host is configured to do.
pub(crate) fn show_info(host: &Host, config_files: &[String]) -> Result<()> {
    let settings = host.scm.settings();
    let summary = Summary {
        scm_type: host.scm.scm_type(),
        key: host.scm.key(),
        image: &settings.container.image,
        head: &settings.head,
        pinned_revision: settings.pinned.token(),
        requires_workspace_for_polling: host.scm.requires_workspace_for_polling(),
        backend: host.backend_name,
        changelog_parser: host.scm.changelog_parser().name(),
        browser: settings.browser_base.as_ref().map(url::Url::as_str),
        state_directory: host.store.directory().display().to_string(),
        config_files,
    };

    if host.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let none = Theme::dimmed("(none)");
    println!("{}", Theme::header(&format!("{DISPLAY_NAME} SCM")));
    println!("{}", Theme::field("type", summary.scm_type));
    println!("{}", Theme::field("key", &summary.key));
    println!("{}", Theme::field("image", summary.image));
    println!("{}", Theme::field("head", summary.head));
    println!(
        "{}",
        Theme::field("pinned", summary.pinned_revision.unwrap_or(&none))
    );
    println!(
        "{}",
        Theme::field(
            "polling",
            if summary.requires_workspace_for_polling {
                "needs workspace"
            } else {
                "workspace-free"
            }
        )
    );
    println!("{}", Theme::field("backend", summary.backend));
    println!("{}", Theme::field("parser", summary.changelog_parser));
    println!("{}", Theme::field("browser", summary.browser.unwrap_or(&none)));
    println!("{}", Theme::field("state", &summary.state_directory));
    if summary.config_files.is_empty() {
        println!("{}", Theme::field("config", &none));
    } else {
        for file in summary.config_files {
            println!("{}", Theme::field("config", file));
        }
    }
    Ok(())
}
