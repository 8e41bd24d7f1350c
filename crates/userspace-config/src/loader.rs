//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` into the base tree
//! 2. Merge `USERSPACE_SCM_*` environment fallbacks
//! 3. Merge the config file (explicit path, or the first one discovered)
//! 4. Deserialize the merged tree into [`Config`]
//! 5. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{collect_env_vars, env_overlay};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Project-local config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".userspace-scm.toml";

/// Application directory name under the platform config and data dirs.
const APP_DIR: &str = "userspace-scm";

/// A loaded configuration and the files it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The validated configuration.
    pub config: Config,
    /// Files merged into it, in load order.
    pub loaded_files: Vec<String>,
}

/// Load configuration from `explicit`, or from the first default location
/// that exists.
///
/// # Errors
///
/// Returns a [`ConfigError`] if an explicit file is missing, any file is
/// malformed or too large, or the merged configuration fails validation.
pub fn load(explicit: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    let search = if explicit.is_some() {
        Vec::new()
    } else {
        default_search_paths()
    };
    load_with(explicit, &search, &collect_env_vars())
}

/// Load with an explicit search list and environment snapshot.
///
/// # Errors
///
/// See [`load`].
pub fn load_with(
    explicit: Option<&Path>,
    search: &[PathBuf],
    env: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    // 1. Embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    // 2. Environment fallbacks.
    deep_merge(&mut merged, &env_overlay(env));

    // 3. Config file.
    let mut loaded_files = Vec::new();
    let file = match explicit {
        Some(path) => {
            let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
                path: path.display().to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "config file does not exist",
                ),
            })?;
            Some((overlay, path.to_path_buf()))
        },
        None => discover(search)?,
    };
    if let Some((overlay, path)) = file {
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded config file");
        loaded_files.push(path.display().to_string());
    }

    // 4. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 5. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_files,
    })
}

/// Default config locations, highest priority first.
#[must_use]
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(PROJECT_CONFIG_FILE)];
    if let Some(dirs) = directories::BaseDirs::new() {
        paths.push(dirs.config_dir().join(APP_DIR).join("config.toml"));
    }
    paths
}

/// Platform default directory for revision state files.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] if no home directory can be determined.
pub fn default_state_directory() -> ConfigResult<PathBuf> {
    directories::ProjectDirs::from("", "", APP_DIR)
        .map(|dirs| dirs.data_dir().join("states"))
        .ok_or(ConfigError::NoHomeDir)
}

fn discover(search: &[PathBuf]) -> ConfigResult<Option<(toml::Value, PathBuf)>> {
    for path in search {
        if let Some(overlay) = try_load_file(path)? {
            return Ok(Some((overlay, path.clone())));
        }
    }
    debug!("no config file found, using defaults and environment");
    Ok(None)
}

/// Recursively merge `overlay` into `base`. Tables merge per key; anything
/// else in the overlay replaces the base value.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Try to load a file, returning `None` if it doesn't exist.
///
/// Reads once and checks the size afterwards, so there is no window between
/// a metadata check and the read.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {size} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit"
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}
