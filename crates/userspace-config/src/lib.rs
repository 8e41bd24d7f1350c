//! Configuration for the userspace SCM.
//!
//! A single [`Config`] type describes which delegate to run, how to run it,
//! where to persist revision states, and how to log.
//!
//! # Usage
//!
//! ```rust,no_run
//! use userspace_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("delegate image: {}", resolved.config.scm.image);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Config file**: the `--config` path, or else the first of
//!    `./.userspace-scm.toml` and `<config dir>/userspace-scm/config.toml`
//! 2. **Environment variables** (`USERSPACE_SCM_IMAGE`, `_CONFIG`, `_HEAD`,
//!    `_REVISION`, `_LOG`), used where the file is silent
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! # Design
//!
//! This crate has no dependencies on the other userspace crates. Conversion
//! into domain settings happens in the CLI's bridge module.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{PROJECT_CONFIG_FILE, ResolvedConfig};
pub use types::*;

impl Config {
    /// Load configuration from `path`, or from the default locations.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is missing, malformed or too large,
    /// or the final configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(path)
    }

    /// Configured state directory, or the platform default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] if no directory is configured and
    /// the platform default cannot be determined.
    pub fn state_directory(&self) -> ConfigResult<std::path::PathBuf> {
        match &self.state.directory {
            Some(dir) => Ok(dir.clone()),
            None => loader::default_state_directory(),
        }
    }
}
