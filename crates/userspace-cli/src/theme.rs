//! CLI theme and styling.

use colored::Colorize;
use userspace_protocol::ChangeKind;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a labelled value.
    pub(crate) fn field(label: &str, value: &str) -> String {
        format!("  {:<10} {}", format!("{label}:").dimmed(), value)
    }

    /// Format a change kind in its traffic-light color.
    pub(crate) fn change_kind(kind: ChangeKind) -> String {
        match kind {
            ChangeKind::None => kind.as_str().green().to_string(),
            ChangeKind::Incomparable => kind.as_str().yellow().to_string(),
            ChangeKind::Significant => kind.as_str().red().bold().to_string(),
        }
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }
}
