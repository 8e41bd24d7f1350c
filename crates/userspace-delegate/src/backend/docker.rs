//! Docker CLI backend.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command as ProcessCommand;
use tracing::{debug, warn};
use userspace_protocol::Command;
use uuid::Uuid;

use super::{ContainerBackend, DelegateOutput, run_process};
use crate::context::ExecutionContext;
use crate::error::{DelegateError, DelegateResult};
use crate::spec::ContainerSpec;

/// Path the workspace is mounted at inside the container.
const WORKSPACE_MOUNT: &str = "/workspace";

/// Prefix of generated container names.
const CONTAINER_PREFIX: &str = "userspace-scm-";

/// Force-remove a named container through the container CLI.
async fn remove_container(program: &str, name: &str) {
    let status = ProcessCommand::new(program)
        .args(["rm", "--force", name])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => debug!(container = name, "container removed"),
        Ok(status) => warn!(container = name, status = %status, "container removal failed"),
        Err(e) => warn!(container = name, error = %e, "could not run container removal"),
    }
}

/// Removes the container unless disarmed.
///
/// Dropping an armed guard (the invocation was cancelled) schedules the
/// removal on the current runtime, since killing the CLI client leaves the
/// container running.
struct ContainerCleanup {
    program: String,
    name: String,
    armed: bool,
}

impl ContainerCleanup {
    fn new(program: &str, name: &str) -> Self {
        Self {
            program: program.to_owned(),
            name: name.to_owned(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }

    async fn remove_now(mut self) {
        self.armed = false;
        remove_container(&self.program, &self.name).await;
    }
}

impl Drop for ContainerCleanup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let program = std::mem::take(&mut self.program);
        let name = std::mem::take(&mut self.name);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(container = %name, "removing container of abandoned run");
                handle.spawn(async move { remove_container(&program, &name).await });
            },
            Err(_) => warn!(container = %name, "no runtime to remove abandoned container"),
        }
    }
}

/// Runs delegates with `docker run --rm -i`.
///
/// Each run gets a generated `--name`. When the run is cancelled or times
/// out the container is force-removed, not just the CLI client.
#[derive(Debug, Clone)]
pub struct DockerBackend {
    program: String,
    run_args: Vec<String>,
    timeout: Option<Duration>,
}

impl Default for DockerBackend {
    fn default() -> Self {
        Self {
            program: "docker".to_owned(),
            run_args: Vec::new(),
            timeout: None,
        }
    }
}

impl DockerBackend {
    /// Backend using the `docker` binary from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different container CLI (for example `podman`).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Extra arguments inserted after `run --rm -i`.
    #[must_use]
    pub fn with_run_args(mut self, args: Vec<String>) -> Self {
        self.run_args = args;
        self
    }

    /// Kill the container run after `limit`.
    #[must_use]
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    /// Arguments passed to the container CLI for one command run as the
    /// container `name`.
    ///
    /// Build environment variables are passed through by name, so their
    /// values come from the CLI's environment rather than its arguments. Wire
    /// pairs follow and take precedence.
    #[must_use]
    pub fn build_args(
        &self,
        name: &str,
        spec: &ContainerSpec,
        context: &ExecutionContext,
        command: &Command,
    ) -> Vec<String> {
        let mut args = vec![
            "run".to_owned(),
            "--rm".to_owned(),
            "-i".to_owned(),
            "--name".to_owned(),
            name.to_owned(),
        ];
        args.extend(self.run_args.iter().cloned());

        if let Some(root) = context.root() {
            args.push("--volume".to_owned());
            args.push(format!("{}:{WORKSPACE_MOUNT}", root.display()));
            args.push("--workdir".to_owned());
            args.push(WORKSPACE_MOUNT.to_owned());
        }

        for key in context.env().keys() {
            args.push("--env".to_owned());
            args.push(key.clone());
        }

        for (arg, value) in command.pairs() {
            args.push("--env".to_owned());
            args.push(format!("{arg}={value}"));
        }

        args.push(spec.image.clone());
        args
    }
}

#[async_trait]
impl ContainerBackend for DockerBackend {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn execute(
        &self,
        spec: &ContainerSpec,
        context: &ExecutionContext,
        command: &Command,
    ) -> DelegateResult<DelegateOutput> {
        let name = format!("{CONTAINER_PREFIX}{}", Uuid::new_v4().simple());
        let args = self.build_args(&name, spec, context, command);
        debug!(program = %self.program, args = ?args, "running container");

        let mut cmd = ProcessCommand::new(&self.program);
        cmd.args(&args);
        cmd.envs(context.env());

        let cleanup = ContainerCleanup::new(&self.program, &name);
        let result = run_process(cmd, &self.program, spec.config.as_bytes(), self.timeout).await;
        match &result {
            Err(DelegateError::TimedOut { .. }) => cleanup.remove_now().await,
            _ => cleanup.disarm(),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use userspace_protocol::{ArgName, Verb};

    fn compare() -> Command {
        Command::new(Verb::Compare)
            .arg(ArgName::Head, Some("main"))
            .arg(ArgName::Revision, None::<String>)
            .arg(ArgName::Baseline, Some("r1"))
    }

    #[test]
    fn test_args_without_workspace() {
        let backend = DockerBackend::new();
        let args = backend.build_args(
            "c1",
            &ContainerSpec::new("acme/git-delegate:1"),
            &ExecutionContext::local(),
            &compare(),
        );
        assert_eq!(
            args,
            vec![
                "run",
                "--rm",
                "-i",
                "--name",
                "c1",
                "--env",
                "COMMAND=compare",
                "--env",
                "HEAD=main",
                "--env",
                "BASELINE=r1",
                "acme/git-delegate:1",
            ]
        );
    }

    #[test]
    fn test_args_mount_workspace() {
        let backend = DockerBackend::new().with_run_args(vec!["--network=host".to_owned()]);
        let args = backend.build_args(
            "c1",
            &ContainerSpec::new("img"),
            &ExecutionContext::workspace("/builds/42"),
            &Command::new(Verb::Identify),
        );
        assert_eq!(
            args,
            vec![
                "run",
                "--rm",
                "-i",
                "--name",
                "c1",
                "--network=host",
                "--volume",
                "/builds/42:/workspace",
                "--workdir",
                "/workspace",
                "--env",
                "COMMAND=identify",
                "img",
            ]
        );
    }

    #[test]
    fn test_build_env_passed_by_name() {
        let args = DockerBackend::new().build_args(
            "c1",
            &ContainerSpec::new("img"),
            &ExecutionContext::local().with_env("BUILD_NUMBER", "17"),
            &Command::new(Verb::Identify),
        );
        assert_eq!(
            args,
            vec![
                "run",
                "--rm",
                "-i",
                "--name",
                "c1",
                "--env",
                "BUILD_NUMBER",
                "--env",
                "COMMAND=identify",
                "img",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let backend = DockerBackend::new().with_program("/nonexistent/docker-cli");
        let err = backend
            .execute(
                &ContainerSpec::new("img"),
                &ExecutionContext::local(),
                &Command::new(Verb::Identify),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DelegateError::Spawn { .. }));
    }

    #[cfg(unix)]
    mod cleanup {
        use super::*;
        use std::path::{Path, PathBuf};

        const ETXTBSY: i32 = 26;

        /// A container CLI stand-in that logs its arguments and runs
        /// `on_run` for the `run` subcommand.
        fn fake_cli(dir: &Path, on_run: &str) -> (PathBuf, PathBuf) {
            use std::os::unix::fs::PermissionsExt;

            let log = dir.join("calls.log");
            let script = dir.join("fake-docker");
            std::fs::write(
                &script,
                format!(
                    "#!/bin/sh\nprintf '%s\\n' \"$*\" >> '{}'\nif [ \"$1\" = run ]; then exec sleep 30; fi\n",
                    log.display()
                ),
            )
            .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
            (script, log)
        }

        fn backend(script: &Path) -> DockerBackend {
            DockerBackend::new().with_program(script.display().to_string())
        }

        async fn execute(backend: &DockerBackend) -> DelegateResult<DelegateOutput> {
            backend
                .execute(
                    &ContainerSpec::new("img"),
                    &ExecutionContext::local(),
                    &Command::new(Verb::Identify),
                )
                .await
        }

        fn is_busy(result: &DelegateResult<DelegateOutput>) -> bool {
            matches!(
                result,
                Err(DelegateError::Spawn { source, .. }) if source.raw_os_error() == Some(ETXTBSY)
            )
        }

        async fn wait_for_removal(log: &Path) -> Vec<String> {
            for _ in 0..100 {
                let calls: Vec<String> = std::fs::read_to_string(log)
                    .unwrap_or_default()
                    .lines()
                    .map(str::to_owned)
                    .collect();
                if calls.iter().any(|call| call.starts_with("rm --force ")) {
                    return calls;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            panic!("container was never removed");
        }

        fn container_name(calls: &[String]) -> String {
            let run = calls.iter().find(|call| call.starts_with("run ")).unwrap();
            let mut words = run.split(' ');
            words.find(|word| *word == "--name").unwrap();
            words.next().unwrap().to_owned()
        }

        #[tokio::test]
        async fn test_timeout_removes_container() {
            let dir = tempfile::tempdir().unwrap();
            let (script, log) = fake_cli(dir.path(), "exec sleep 30");
            let backend = backend(&script).with_timeout(Some(Duration::from_millis(300)));

            let mut result = execute(&backend).await;
            for _ in 0..5 {
                if !is_busy(&result) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
                result = execute(&backend).await;
            }
            assert!(matches!(result, Err(DelegateError::TimedOut { .. })));

            let calls = wait_for_removal(&log).await;
            let name = container_name(&calls);
            assert!(name.starts_with(CONTAINER_PREFIX));
            assert!(calls.contains(&format!("rm --force {name}")));
        }

        #[tokio::test]
        async fn test_dropped_run_removes_container() {
            let dir = tempfile::tempdir().unwrap();
            let (script, log) = fake_cli(dir.path(), "exec sleep 30");
            let backend = backend(&script);

            let mut abandoned = false;
            for _ in 0..5 {
                match tokio::time::timeout(Duration::from_millis(300), execute(&backend)).await {
                    Err(_) => {
                        abandoned = true;
                        break;
                    },
                    Ok(result) if is_busy(&result) => {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    },
                    Ok(other) => panic!("run finished unexpectedly: {other:?}"),
                }
            }
            assert!(abandoned);

            let calls = wait_for_removal(&log).await;
            let name = container_name(&calls);
            assert!(calls.contains(&format!("rm --force {name}")));
        }

        #[tokio::test]
        async fn test_finished_run_is_not_removed() {
            let dir = tempfile::tempdir().unwrap();
            let (script, log) = fake_cli(dir.path(), "exit 0");
            let backend = backend(&script);

            let mut result = execute(&backend).await;
            for _ in 0..5 {
                if !is_busy(&result) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
                result = execute(&backend).await;
            }
            assert!(result.unwrap().is_success());

            tokio::time::sleep(Duration::from_millis(200)).await;
            let calls = std::fs::read_to_string(&log).unwrap();
            assert_eq!(calls.lines().count(), 1);
            assert!(calls.starts_with("run "));
        }
    }
}
