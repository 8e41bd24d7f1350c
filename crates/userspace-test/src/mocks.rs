//! Mock container backend.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use userspace_delegate::{
    ContainerBackend, ContainerSpec, DelegateError, DelegateOutput, DelegateResult,
    ExecutionContext,
};
use userspace_protocol::Command;

/// One queued reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this output.
    Output(DelegateOutput),
    /// Never finish; only cancellation ends the call.
    Hang,
    /// Fail as if the backend could not be started.
    SpawnFailure(String),
}

/// A recorded call.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The spec the call ran against.
    pub spec: ContainerSpec,
    /// The execution context supplied.
    pub context: ExecutionContext,
    /// The command as decoded back from its wire form.
    pub command: Command,
    /// The wire form as the delegate would receive it.
    pub wire: Vec<String>,
}

/// Backend that replays queued replies and records every call.
///
/// Uses `std::sync::Mutex` so builder methods work without a runtime.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedBackend {
    /// Create a backend with an empty reply queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    #[must_use]
    pub fn with_reply(self, reply: ScriptedReply) -> Self {
        self.queue(reply);
        self
    }

    /// Queue a successful reply with the given stdout.
    #[must_use]
    pub fn with_stdout(self, stdout: impl Into<Vec<u8>>) -> Self {
        self.with_reply(ScriptedReply::Output(DelegateOutput::success(stdout)))
    }

    /// Queue a failing reply.
    #[must_use]
    pub fn with_failure(self, exit_code: i32, stderr: &str) -> Self {
        self.with_reply(ScriptedReply::Output(DelegateOutput {
            exit_code: Some(exit_code),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }))
    }

    /// Queue a reply that never completes.
    #[must_use]
    pub fn with_hang(self) -> Self {
        self.with_reply(ScriptedReply::Hang)
    }

    /// Queue a reply.
    pub fn queue(&self, reply: ScriptedReply) {
        if let Ok(mut guard) = self.replies.lock() {
            guard.push_back(reply);
        }
    }

    /// All calls made so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// The most recent call.
    #[must_use]
    pub fn last_invocation(&self) -> Option<Invocation> {
        self.invocations
            .lock()
            .ok()
            .and_then(|guard| guard.last().cloned())
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        self.replies.lock().ok().and_then(|mut guard| guard.pop_front())
    }
}

#[async_trait]
impl ContainerBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn execute(
        &self,
        spec: &ContainerSpec,
        context: &ExecutionContext,
        command: &Command,
    ) -> DelegateResult<DelegateOutput> {
        let wire = command.encode();
        let decoded = Command::decode_wire(&wire).map_err(|e| DelegateError::Spawn {
            program: "scripted".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
        })?;

        if let Ok(mut guard) = self.invocations.lock() {
            guard.push(Invocation {
                spec: spec.clone(),
                context: context.clone(),
                command: decoded,
                wire,
            });
        }

        match self.next_reply() {
            Some(ScriptedReply::Output(output)) => Ok(output),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            Some(ScriptedReply::SpawnFailure(message)) => Err(DelegateError::Spawn {
                program: spec.image.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            }),
            None => Err(DelegateError::Spawn {
                program: spec.image.clone(),
                source: std::io::Error::other(format!(
                    "no scripted reply queued for {}",
                    command.verb()
                )),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use userspace_protocol::{ArgName, Verb};

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let backend = ScriptedBackend::new().with_stdout("one").with_failure(2, "bad");
        let command = Command::new(Verb::Compare).arg(ArgName::Head, Some("main"));

        let first = backend
            .execute(
                &ContainerSpec::new("img"),
                &ExecutionContext::local(),
                &command,
            )
            .await
            .unwrap();
        assert_eq!(first.stdout, b"one");

        let second = backend
            .execute(
                &ContainerSpec::new("img"),
                &ExecutionContext::local(),
                &command,
            )
            .await
            .unwrap();
        assert_eq!(second.exit_code, Some(2));

        assert_eq!(backend.invocation_count(), 2);
        let last = backend.last_invocation().unwrap();
        assert_eq!(last.command, command);
        assert_eq!(last.wire, vec!["COMMAND", "compare", "HEAD", "main"]);
    }

    #[tokio::test]
    async fn test_empty_queue_is_error() {
        let backend = ScriptedBackend::new();
        let result = backend
            .execute(
                &ContainerSpec::new("img"),
                &ExecutionContext::local(),
                &Command::new(Verb::Identify),
            )
            .await;
        assert!(matches!(result, Err(DelegateError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_hang_is_cancellable_through_invoker() {
        let backend = ScriptedBackend::new().with_hang();
        let invoker = userspace_delegate::DelegateInvoker::new(
            Arc::new(backend.clone()),
            ContainerSpec::new("img"),
        );
        let cancel = tokio_util::sync::CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = invoker
            .run(
                &ExecutionContext::local(),
                &cancel,
                &Command::new(Verb::Identify),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DelegateError::Cancelled));
        assert_eq!(backend.invocation_count(), 1);
    }
}
