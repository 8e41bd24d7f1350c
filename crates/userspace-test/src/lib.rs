//! Userspace Test - shared test utilities for the userspace SCM crates.
//!
//! Provides a scripted [`ContainerBackend`](userspace_delegate::ContainerBackend)
//! that replays queued replies and records every invocation, plus a few
//! fixtures for building delegate replies.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! userspace-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use userspace_test::ScriptedBackend;
//!
//! let backend = ScriptedBackend::new().with_stdout("SIGNIFICANT\nabc123");
//! // ... run an operation ...
//! assert_eq!(backend.invocation_count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;

/// Install a test subscriber that honours `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
