//! Userspace Delegate - executes protocol commands inside a container.
//!
//! The [`DelegateInvoker`] takes a [`Command`](userspace_protocol::Command),
//! hands it to a [`ContainerBackend`] in an [`ExecutionContext`], and returns
//! the raw stdout. It never interprets that output; decoding belongs to
//! `userspace-protocol`.
//!
//! # Backends
//!
//! - [`DockerBackend`]: `docker run --rm -i <image>` with each wire pair passed
//!   as `--env NAME=VALUE` and the workspace mounted at `/workspace`
//! - [`LocalProcessBackend`]: runs the image reference as a local executable
//!   with the pairs as environment variables
//!
//! Both pipe the opaque container config to the delegate's stdin.
//!
//! # Cancellation
//!
//! Every invocation races the caller's
//! [`CancellationToken`](tokio_util::sync::CancellationToken). When the token
//! fires first the backend future is dropped, which kills the child process,
//! and the call fails with [`DelegateError::Cancelled`].

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod backend;
pub mod context;
pub mod error;
pub mod invoker;
pub mod spec;

pub use backend::{ContainerBackend, DelegateOutput, DockerBackend, LocalProcessBackend};
pub use context::ExecutionContext;
pub use error::{DelegateError, DelegateResult};
pub use invoker::DelegateInvoker;
pub use spec::ContainerSpec;
