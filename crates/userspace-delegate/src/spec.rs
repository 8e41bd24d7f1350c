//! Container specification.

use serde::{Deserialize, Serialize};

/// Identifies the delegate image and the opaque config handed to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Image reference (or executable path for the local backend).
    pub image: String,
    /// Opaque configuration, piped to the delegate on stdin.
    #[serde(default)]
    pub config: String,
}

impl ContainerSpec {
    /// Create a spec with an empty config.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            config: String::new(),
        }
    }

    /// Set the delegate config.
    #[must_use]
    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }
}
