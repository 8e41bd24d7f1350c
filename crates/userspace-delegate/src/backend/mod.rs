//! Container backends - the processes that actually run a delegate.

mod docker;
mod local;

pub use docker::DockerBackend;
pub use local::LocalProcessBackend;

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as ProcessCommand;
use tokio::time::timeout;
use tracing::debug;
use userspace_protocol::Command;

use crate::context::ExecutionContext;
use crate::error::{DelegateError, DelegateResult};
use crate::spec::ContainerSpec;

/// Raw result of one delegate run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelegateOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout, the protocol reply.
    pub stdout: Vec<u8>,
    /// Captured stderr, diagnostics only.
    pub stderr: Vec<u8>,
}

impl DelegateOutput {
    /// A successful run with the given stdout.
    #[must_use]
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Whether the delegate exited with status zero.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stderr decoded lossily for display.
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_owned()
    }
}

/// Something that can run a delegate command.
///
/// Implementations must be cancel-safe: dropping the returned future has to
/// stop the delegate.
#[async_trait]
pub trait ContainerBackend: Send + Sync + std::fmt::Debug {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Run `command` for the delegate described by `spec` in `context`.
    ///
    /// A non-zero exit is reported through [`DelegateOutput::exit_code`], not
    /// as an error.
    async fn execute(
        &self,
        spec: &ContainerSpec,
        context: &ExecutionContext,
        command: &Command,
    ) -> DelegateResult<DelegateOutput>;
}

/// Spawn `cmd`, feed `stdin`, and collect its output.
///
/// Stdin is written while stdout and stderr are drained, so a delegate that
/// prints before it reads its config cannot block on a full pipe. The child
/// is killed if this future is dropped or the timeout elapses.
pub(crate) async fn run_process(
    mut cmd: ProcessCommand,
    program: &str,
    stdin: &[u8],
    timeout_duration: Option<Duration>,
) -> DelegateResult<DelegateOutput> {
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| DelegateError::Spawn {
        program: program.to_owned(),
        source,
    })?;
    let stdin_pipe = child.stdin.take();

    let run = async move {
        // Close stdin after writing so the delegate sees EOF. A delegate that
        // exits without reading its config is not an error.
        let feed = async move {
            if let Some(mut pipe) = stdin_pipe {
                if let Err(e) = pipe.write_all(stdin).await {
                    debug!(error = %e, "delegate closed stdin early");
                }
                let _ = pipe.shutdown().await;
            }
        };
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        output
    };

    let output = match timeout_duration {
        Some(limit) => timeout(limit, run)
            .await
            .map_err(|_| DelegateError::TimedOut {
                timeout_secs: limit.as_secs(),
            })??,
        None => run.await?,
    };

    Ok(DelegateOutput {
        exit_code: output.status.code(),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
