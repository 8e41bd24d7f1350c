//! Local process backend.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command as ProcessCommand;
use tracing::debug;
use userspace_protocol::Command;

use super::{ContainerBackend, DelegateOutput, run_process};
use crate::context::ExecutionContext;
use crate::error::DelegateResult;
use crate::spec::ContainerSpec;

/// Runs the image reference as a local executable.
///
/// Wire pairs become environment variables and the workspace root, if any,
/// becomes the working directory. Useful for developing a delegate without a
/// container runtime.
#[derive(Debug, Clone, Default)]
pub struct LocalProcessBackend {
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl LocalProcessBackend {
    /// Create a backend with no extra arguments and no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments passed to the executable.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Kill the process after `limit`.
    #[must_use]
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }
}

#[async_trait]
impl ContainerBackend for LocalProcessBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn execute(
        &self,
        spec: &ContainerSpec,
        context: &ExecutionContext,
        command: &Command,
    ) -> DelegateResult<DelegateOutput> {
        debug!(program = %spec.image, context = context.kind(), "running local delegate");

        let mut cmd = ProcessCommand::new(&spec.image);
        cmd.args(&self.args);
        cmd.envs(context.env());
        for (name, value) in command.pairs() {
            cmd.env(name, value);
        }
        if let Some(root) = context.root() {
            cmd.current_dir(root);
        }

        run_process(cmd, &spec.image, spec.config.as_bytes(), self.timeout).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use userspace_protocol::{ArgName, Verb};

    /// `sh` reads the delegate script from stdin, so the config is the script.
    fn shell(script: &str) -> ContainerSpec {
        ContainerSpec::new("sh").with_config(script)
    }

    #[tokio::test]
    async fn test_pairs_become_env() {
        let command = Command::new(Verb::Compare).arg(ArgName::Head, Some("feature/x"));
        let output = LocalProcessBackend::new()
            .execute(
                &shell(r#"printf '%s|%s|%s' "$COMMAND" "$HEAD" "${REVISION-unset}""#),
                &ExecutionContext::local(),
                &command,
            )
            .await
            .unwrap();

        assert!(output.is_success());
        assert_eq!(output.stdout, b"compare|feature/x|unset");
    }

    #[tokio::test]
    async fn test_workspace_is_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "here").unwrap();

        let output = LocalProcessBackend::new()
            .execute(
                &shell("cat marker"),
                &ExecutionContext::workspace(dir.path()),
                &Command::new(Verb::Identify),
            )
            .await
            .unwrap();

        assert_eq!(output.stdout, b"here");
    }

    #[tokio::test]
    async fn test_context_env_is_passed() {
        let output = LocalProcessBackend::new()
            .execute(
                &shell(r#"printf '%s' "$BUILD_NUMBER""#),
                &ExecutionContext::local().with_env("BUILD_NUMBER", "17"),
                &Command::new(Verb::Identify),
            )
            .await
            .unwrap();

        assert_eq!(output.stdout, b"17");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported_not_raised() {
        let output = LocalProcessBackend::new()
            .execute(
                &shell("echo broken >&2; exit 3"),
                &ExecutionContext::local(),
                &Command::new(Verb::Identify),
            )
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr_text(), "broken");
    }

    #[tokio::test]
    async fn test_large_output_before_large_config_read() {
        let config = "x".repeat(200_000);
        let backend = LocalProcessBackend::new().with_args(vec![
            "-c".to_owned(),
            "head -c 200000 /dev/zero; cat >/dev/null".to_owned(),
        ]);
        let spec = ContainerSpec::new("sh").with_config(config);
        let context = ExecutionContext::local();
        let command = Command::new(Verb::Checkout);
        let run = backend.execute(&spec, &context, &command);

        let output = tokio::time::timeout(Duration::from_secs(10), run)
            .await
            .expect("pipes must drain while the config is written")
            .unwrap();

        assert!(output.is_success());
        assert_eq!(output.stdout.len(), 200_000);
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = LocalProcessBackend::new()
            .with_timeout(Some(Duration::from_millis(100)))
            .execute(
                &shell("sleep 10"),
                &ExecutionContext::local(),
                &Command::new(Verb::Identify),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, crate::DelegateError::TimedOut { .. }));
    }
}
