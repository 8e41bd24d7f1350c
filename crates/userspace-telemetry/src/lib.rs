//! Userspace Telemetry - logging and tracing for SCM operations.
//!
//! This crate provides:
//! - Configurable logging setup (pretty, compact, JSON or full format) to
//!   stdout, stderr or rolling files
//! - [`OperationContext`], which correlates everything logged during one
//!   checkout, identify, poll or changelog parse
//!
//! # Example
//!
//! ```rust,no_run
//! use userspace_telemetry::{LogConfig, LogFormat, OperationContext, setup_logging};
//!
//! # fn main() -> Result<(), userspace_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("userspace_delegate=debug");
//! setup_logging(&config)?;
//!
//! let ctx = OperationContext::new("checkout").with_build_id("build-7");
//! let _guard = ctx.enter();
//! tracing::info!("checking out");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{OperationContext, OperationGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};
