//! Static table of SCM implementations a host can instantiate.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use userspace_delegate::ContainerBackend;

use crate::error::{ScmError, ScmResult};
use crate::orchestrator::UserspaceScm;
use crate::settings::ScmSettings;
use crate::{DISPLAY_NAME, SCHEME};

/// Constructor for an SCM instance.
pub type ScmFactory = fn(ScmSettings, Arc<dyn ContainerBackend>) -> UserspaceScm;

/// Describes one registered SCM.
#[derive(Debug, Clone, Copy)]
pub struct ScmDescriptor {
    /// Scheme name, e.g. `userspace`.
    pub scheme: &'static str,
    /// Human-readable name for host UIs.
    pub display_name: &'static str,
    /// Builds an instance from settings.
    pub factory: ScmFactory,
}

impl ScmDescriptor {
    /// Descriptor for the userspace SCM.
    #[must_use]
    pub fn userspace() -> Self {
        Self {
            scheme: SCHEME,
            display_name: DISPLAY_NAME,
            factory: UserspaceScm::new,
        }
    }

    /// Whether this SCM can be offered for the given job. Always true.
    #[must_use]
    pub fn is_applicable(&self, _job_name: &str) -> bool {
        true
    }

    /// Instantiate the SCM.
    #[must_use]
    pub fn create(&self, settings: ScmSettings, backend: Arc<dyn ContainerBackend>) -> UserspaceScm {
        (self.factory)(settings, backend)
    }
}

/// Scheme name to descriptor.
#[derive(Debug, Clone, Default)]
pub struct ScmRegistry {
    descriptors: BTreeMap<&'static str, ScmDescriptor>,
}

impl ScmRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `userspace` SCM.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ScmDescriptor::userspace());
        registry
    }

    /// Add or replace a descriptor. Returns the one it replaced.
    pub fn register(&mut self, descriptor: ScmDescriptor) -> Option<ScmDescriptor> {
        debug!(scheme = descriptor.scheme, "registering SCM");
        self.descriptors.insert(descriptor.scheme, descriptor)
    }

    /// Look up a descriptor.
    #[must_use]
    pub fn get(&self, scheme: &str) -> Option<&ScmDescriptor> {
        self.descriptors.get(scheme)
    }

    /// Registered scheme names in sorted order.
    pub fn schemes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.keys().copied()
    }

    /// Instantiate the SCM registered under `scheme`.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::UnknownScheme`] if nothing is registered under it.
    pub fn create(
        &self,
        scheme: &str,
        settings: ScmSettings,
        backend: Arc<dyn ContainerBackend>,
    ) -> ScmResult<UserspaceScm> {
        self.get(scheme)
            .map(|descriptor| descriptor.create(settings, backend))
            .ok_or_else(|| ScmError::UnknownScheme(scheme.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use userspace_test::{ScriptedBackend, test_container_spec};

    #[test]
    fn test_builtin_has_userspace() {
        let registry = ScmRegistry::builtin();
        assert_eq!(registry.schemes().collect::<Vec<_>>(), vec!["userspace"]);

        let descriptor = registry.get("userspace").unwrap();
        assert_eq!(descriptor.display_name, "Userspace");
        assert!(descriptor.is_applicable("any-job"));
    }

    #[test]
    fn test_create_builds_scm() {
        let scm = ScmRegistry::builtin()
            .create(
                "userspace",
                ScmSettings::new(test_container_spec(), "main"),
                Arc::new(ScriptedBackend::new()),
            )
            .unwrap();
        assert_eq!(scm.scm_type(), "userspace");
        assert_eq!(scm.settings().head, "main");
    }

    #[test]
    fn test_unknown_scheme() {
        let err = ScmRegistry::builtin()
            .create(
                "git",
                ScmSettings::new(test_container_spec(), "main"),
                Arc::new(ScriptedBackend::new()),
            )
            .unwrap_err();
        assert!(matches!(err, ScmError::UnknownScheme(ref s) if s == "git"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ScmRegistry::builtin();
        let previous = registry.register(ScmDescriptor {
            display_name: "Userspace (custom)",
            ..ScmDescriptor::userspace()
        });
        assert!(previous.is_some());
        assert_eq!(
            registry.get("userspace").unwrap().display_name,
            "Userspace (custom)"
        );
    }
}
