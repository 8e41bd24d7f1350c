//! Delegate invoker - runs one command and returns its raw stdout.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use userspace_protocol::Command;

use crate::backend::ContainerBackend;
use crate::context::ExecutionContext;
use crate::error::{DelegateError, DelegateResult};
use crate::spec::ContainerSpec;

/// Binds a container spec to a backend and runs commands against it.
#[derive(Debug, Clone)]
pub struct DelegateInvoker {
    backend: Arc<dyn ContainerBackend>,
    spec: ContainerSpec,
}

impl DelegateInvoker {
    /// Create an invoker for `spec` on `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn ContainerBackend>, spec: ContainerSpec) -> Self {
        Self { backend, spec }
    }

    /// The container spec commands run against.
    #[must_use]
    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    /// Run `command` and return its stdout.
    ///
    /// The output is not interpreted. A non-zero exit becomes
    /// [`DelegateError::Failed`] carrying the delegate's stderr. If `cancel`
    /// fires before the delegate finishes, the backend future is dropped and
    /// the call fails with [`DelegateError::Cancelled`]; it is never retried.
    ///
    /// # Errors
    ///
    /// Returns a [`DelegateError`] if the delegate cannot be started, exits
    /// unsuccessfully, times out in the backend, or is cancelled.
    pub async fn run(
        &self,
        context: &ExecutionContext,
        cancel: &CancellationToken,
        command: &Command,
    ) -> DelegateResult<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(DelegateError::Cancelled);
        }

        debug!(
            backend = self.backend.name(),
            image = %self.spec.image,
            context = context.kind(),
            command = %command,
            "invoking delegate"
        );

        let output = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(command = %command.verb(), "delegate invocation cancelled");
                return Err(DelegateError::Cancelled);
            },
            result = self.backend.execute(&self.spec, context, command) => result?,
        };

        if !output.is_success() {
            let stderr = output.stderr_text();
            warn!(
                command = %command.verb(),
                exit_code = ?output.exit_code,
                stderr = %stderr,
                "delegate failed"
            );
            return Err(DelegateError::Failed {
                command: command.verb().to_string(),
                exit_code: output.exit_code,
                stderr,
            });
        }

        debug!(
            command = %command.verb(),
            stdout_bytes = output.stdout.len(),
            "delegate finished"
        );
        Ok(output.stdout)
    }
}
