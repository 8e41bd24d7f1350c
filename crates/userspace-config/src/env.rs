//! Environment variable fallbacks.
//!
//! `USERSPACE_SCM_*` variables fill in fields a config file leaves unset.
//! They sit between the embedded defaults and the file in precedence.

use std::collections::HashMap;

use tracing::debug;

/// Prefix shared by all recognised variables.
pub const ENV_PREFIX: &str = "USERSPACE_SCM_";

/// Variable name, section, key.
const ENV_FIELDS: &[(&str, &str, &str)] = &[
    ("USERSPACE_SCM_IMAGE", "scm", "image"),
    ("USERSPACE_SCM_CONFIG", "scm", "config"),
    ("USERSPACE_SCM_HEAD", "scm", "head"),
    ("USERSPACE_SCM_REVISION", "scm", "revision"),
    ("USERSPACE_SCM_LOG", "logging", "level"),
];

/// Snapshot the process environment, keeping only `USERSPACE_SCM_*`.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Build a TOML overlay from recognised variables. Empty values are ignored.
#[must_use]
pub fn env_overlay(env: &HashMap<String, String>) -> toml::Value {
    let mut root = toml::Table::new();

    for (var, section, key) in ENV_FIELDS {
        let Some(value) = env.get(*var).filter(|v| !v.is_empty()) else {
            continue;
        };
        debug!(var, field = %format!("{section}.{key}"), "using environment fallback");

        let entry = root
            .entry((*section).to_owned())
            .or_insert(toml::Value::Table(toml::Table::new()));
        if let toml::Value::Table(table) = entry {
            table.insert((*key).to_owned(), toml::Value::String(value.clone()));
        }
    }

    toml::Value::Table(root)
}
