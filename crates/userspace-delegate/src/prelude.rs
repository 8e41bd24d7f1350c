//! Prelude module - commonly used types for convenient import.
//!
//! Use `use userspace_delegate::prelude::*;` to import all essential types.

// Backends
pub use crate::{ContainerBackend, DelegateOutput, DockerBackend, LocalProcessBackend};

// Invocation
pub use crate::{ContainerSpec, DelegateInvoker, ExecutionContext};

// Errors
pub use crate::{DelegateError, DelegateResult};
