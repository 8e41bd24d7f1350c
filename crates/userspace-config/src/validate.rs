//! Post-merge configuration validation.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{BackendKind, Config};

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_scm(config)?;
    validate_backend(config)?;
    validate_browser(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_scm(config: &Config) -> ConfigResult<()> {
    if config.scm.image.trim().is_empty() {
        return Err(invalid(
            "scm.image",
            "a delegate image is required (set it in the config file or USERSPACE_SCM_IMAGE)",
        ));
    }
    Ok(())
}

fn validate_backend(config: &Config) -> ConfigResult<()> {
    let backend = &config.backend;

    if backend.kind == BackendKind::Docker && backend.program.trim().is_empty() {
        return Err(invalid(
            "backend.program",
            "the docker backend needs a container CLI program",
        ));
    }

    if backend.timeout_secs == Some(0) {
        return Err(invalid(
            "backend.timeout_secs",
            "timeout must be at least 1 second; remove the key for no limit",
        ));
    }

    Ok(())
}

fn validate_browser(config: &Config) -> ConfigResult<()> {
    let Some(raw) = config.browser.base_url.as_deref() else {
        return Ok(());
    };

    let url = Url::parse(raw).map_err(|e| invalid("browser.base_url", format!("{raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(invalid(
            "browser.base_url",
            format!("{raw:?} cannot be used as a base for links"),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}
