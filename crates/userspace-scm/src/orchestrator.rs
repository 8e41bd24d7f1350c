//! SCM operation orchestrator.
//!
//! Each host operation builds one [`Command`], runs it through the
//! [`DelegateInvoker`] and decodes the reply. No state survives between calls:
//! revision states go back to the host, which hands them in again as
//! baselines.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};
use userspace_delegate::{ContainerBackend, DelegateInvoker};
use userspace_protocol::{
    ArgName, BaselineState, Command, PollingDecision, RevisionState, Verb, decode_changelog,
    decode_compare, decode_identify, expect_empty,
};

use crate::SCHEME;
use crate::browser::RepositoryBrowser;
use crate::changelog::{ChangeLogSet, ChangelogParser, HeaderBlockParser};
use crate::context::{BuildContext, JobContext};
use crate::error::{ScmError, ScmResult};
use crate::key::scm_identity_key;
use crate::settings::{PollingMode, ScmSettings};

/// A userspace SCM bound to one job's settings and a container backend.
#[derive(Debug, Clone)]
pub struct UserspaceScm {
    settings: ScmSettings,
    invoker: DelegateInvoker,
    parser: Arc<dyn ChangelogParser>,
}

impl UserspaceScm {
    /// Create an SCM that runs its delegate on `backend`.
    #[must_use]
    pub fn new(settings: ScmSettings, backend: Arc<dyn ContainerBackend>) -> Self {
        let invoker = DelegateInvoker::new(backend, settings.container.clone());
        Self {
            settings,
            invoker,
            parser: Arc::new(HeaderBlockParser),
        }
    }

    /// Replace the changelog parser.
    #[must_use]
    pub fn with_changelog_parser(mut self, parser: Arc<dyn ChangelogParser>) -> Self {
        self.parser = parser;
        self
    }

    /// The settings this SCM was built from.
    #[must_use]
    pub fn settings(&self) -> &ScmSettings {
        &self.settings
    }

    /// Scheme name under which this SCM is registered.
    #[must_use]
    pub fn scm_type(&self) -> &'static str {
        SCHEME
    }

    /// Identity key of this configuration.
    #[must_use]
    pub fn key(&self) -> String {
        scm_identity_key(
            &self.settings.container.image,
            &self.settings.container.config,
            &self.settings.head,
        )
    }

    /// Whether polling needs a workspace.
    #[must_use]
    pub fn requires_workspace_for_polling(&self) -> bool {
        self.settings.polling.requires_workspace()
    }

    /// The parser used for persisted changelogs.
    #[must_use]
    pub fn changelog_parser(&self) -> Arc<dyn ChangelogParser> {
        Arc::clone(&self.parser)
    }

    /// Repository browser derived from configuration.
    #[must_use]
    pub fn guess_browser(&self) -> RepositoryBrowser {
        RepositoryBrowser::new(
            self.settings.browser_base.clone(),
            self.settings.container.image.clone(),
            self.settings.head.clone(),
        )
    }

    /// Check out the head into the build's workspace.
    ///
    /// With a `changelog` destination the delegate's entire stdout is written
    /// there verbatim. Without one the delegate must print nothing. A foreign
    /// baseline is not sent.
    ///
    /// # Errors
    ///
    /// Fails with [`ScmError::ProtocolViolation`] on unexpected output,
    /// [`ScmError::ChangelogWrite`] if the changelog cannot be written, and
    /// with the delegate's own failure or cancellation otherwise.
    pub async fn checkout(
        &self,
        build: &BuildContext,
        baseline: Option<&BaselineState>,
        changelog: Option<&Path>,
    ) -> ScmResult<()> {
        let baseline_token = match baseline {
            Some(BaselineState::Token { state }) => Some(state.data()),
            Some(BaselineState::Foreign { type_name }) => {
                debug!(type_name = %type_name, "ignoring foreign baseline for checkout");
                None
            },
            None => None,
        };

        let command = Command::new(Verb::Checkout)
            .arg(ArgName::Head, Some(self.settings.head.as_str()))
            .arg(ArgName::Revision, self.settings.pinned.token())
            .arg(ArgName::Baseline, baseline_token)
            .arg(
                ArgName::Changelog,
                Some(if changelog.is_some() { "true" } else { "false" }),
            );

        let stdout = self
            .invoker
            .run(&build.execution_context(), &build.cancel, &command)
            .await?;

        match changelog {
            Some(path) => {
                tokio::fs::write(path, decode_changelog(&stdout))
                    .await
                    .map_err(|source| ScmError::ChangelogWrite {
                        path: path.display().to_string(),
                        source,
                    })?;
                debug!(path = %path.display(), bytes = stdout.len(), "changelog written");
            },
            None => expect_empty(command.verb(), &stdout)?,
        }

        info!(
            build_id = %build.build_id,
            head = %self.settings.head,
            "checkout complete"
        );
        Ok(())
    }

    /// Revision state of the build's workspace.
    ///
    /// A pinned revision is returned as-is without running the delegate.
    ///
    /// # Errors
    ///
    /// Returns the delegate's failure or cancellation, or
    /// [`ScmError::ProtocolViolation`] if the reply is not UTF-8.
    pub async fn compute_revision_state(&self, build: &BuildContext) -> ScmResult<RevisionState> {
        if let Some(pinned) = self.settings.pinned.state() {
            debug!(revision = %pinned, "using pinned revision");
            return Ok(pinned.clone());
        }

        let command = Command::new(Verb::Identify);
        let stdout = self
            .invoker
            .run(&build.execution_context(), &build.cancel, &command)
            .await?;
        let state = decode_identify(&stdout)?;

        info!(build_id = %build.build_id, revision = %state, "revision identified");
        Ok(state)
    }

    /// Ask the delegate whether the head moved since `baseline`.
    ///
    /// `workspace` must be `Some` exactly when the configured polling mode
    /// requires a workspace. The change kind is whatever the delegate reports.
    ///
    /// # Errors
    ///
    /// Fails with [`ScmError::ContractViolation`] on a workspace mismatch,
    /// [`ScmError::UnsupportedRevisionState`] for a foreign baseline,
    /// [`ScmError::ProtocolViolation`] for a malformed reply, and with the
    /// delegate's own failure or cancellation otherwise.
    pub async fn poll(
        &self,
        job: &JobContext,
        workspace: Option<&Path>,
        baseline: &BaselineState,
    ) -> ScmResult<PollingDecision> {
        let context = match (self.settings.polling, workspace) {
            (PollingMode::WorkspaceFree, None) => job.local_context(),
            (PollingMode::WorkspaceRequired, Some(root)) => job.workspace_context(root),
            (PollingMode::WorkspaceFree, Some(root)) => {
                return Err(ScmError::ContractViolation(format!(
                    "workspace {} supplied but polling is configured workspace-free",
                    root.display()
                )));
            },
            (PollingMode::WorkspaceRequired, None) => {
                return Err(ScmError::ContractViolation(
                    "polling requires a workspace but none was supplied".to_owned(),
                ));
            },
        };

        let baseline = match baseline {
            BaselineState::Token { state } => state,
            BaselineState::Foreign { type_name } => {
                return Err(ScmError::UnsupportedRevisionState {
                    type_name: type_name.clone(),
                });
            },
        };

        let command = Command::new(Verb::Compare)
            .arg(ArgName::Head, Some(self.settings.head.as_str()))
            .arg(ArgName::Revision, self.settings.pinned.token())
            .arg(ArgName::Baseline, Some(baseline.data()));

        let stdout = self.invoker.run(&context, &job.cancel, &command).await?;
        let (change, latest) = decode_compare(&stdout)?;

        info!(
            job = %job.job_name,
            baseline = %baseline,
            latest = %latest,
            change = change.as_str(),
            "poll complete"
        );
        Ok(PollingDecision::new(baseline.clone(), latest, change))
    }

    /// Parse a changelog written by [`checkout`](Self::checkout).
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::MalformedChangelog`] if the configured parser
    /// rejects the bytes.
    pub fn parse_changelog(&self, build_id: &str, raw: &[u8]) -> ScmResult<ChangeLogSet> {
        let entries = self.parser.parse(raw)?;
        debug!(
            build_id,
            parser = self.parser.name(),
            entries = entries.len(),
            "changelog parsed"
        );
        Ok(ChangeLogSet {
            build_id: build_id.to_owned(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::RawParser;
    use crate::settings::PinnedRevision;
    use tokio_util::sync::CancellationToken;
    use url::Url;
    use userspace_protocol::{ChangeKind, ProtocolError};
    use userspace_test::{ScriptedBackend, compare_reply, test_container_spec};

    fn scm(backend: &ScriptedBackend, settings: ScmSettings) -> UserspaceScm {
        UserspaceScm::new(settings, Arc::new(backend.clone()))
    }

    fn settings() -> ScmSettings {
        ScmSettings::new(test_container_spec(), "main")
    }

    fn build(dir: &Path) -> BuildContext {
        BuildContext::new("build-1", dir)
    }

    fn token(data: &str) -> BaselineState {
        RevisionState::new(data).into()
    }

    #[tokio::test]
    async fn test_checkout_without_changelog_rejects_output() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new().with_stdout("unexpected");

        let err = scm(&backend, settings())
            .checkout(&build(dir.path()), None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScmError::ProtocolViolation(ProtocolError::UnexpectedOutput { .. })
        ));
    }

    #[tokio::test]
    async fn test_checkout_without_changelog_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new().with_stdout("");

        scm(&backend, settings())
            .checkout(&build(dir.path()), None, None)
            .await
            .unwrap();

        let call = backend.last_invocation().unwrap();
        assert_eq!(
            call.wire,
            vec!["COMMAND", "checkout", "HEAD", "main", "CHANGELOG", "false"]
        );
        assert_eq!(call.context.root(), Some(dir.path()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_checkout_writes_changelog_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let raw = b"Revision: r2\n\nSecond\n---\n\xffbinary tail\n".to_vec();
        let backend = ScriptedBackend::new().with_stdout(raw.clone());
        let settings = settings().with_pinned(PinnedRevision::from_config(Some("r2")));
        let sink = dir.path().join("changelog.txt");

        scm(&backend, settings)
            .checkout(&build(dir.path()), Some(&token("r1")), Some(&sink))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&sink).unwrap(), raw);
        let call = backend.last_invocation().unwrap();
        assert_eq!(call.command.get(ArgName::Revision), Some("r2"));
        assert_eq!(call.command.get(ArgName::Baseline), Some("r1"));
        assert_eq!(call.command.get(ArgName::Changelog), Some("true"));
    }

    #[tokio::test]
    async fn test_checkout_omits_foreign_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new().with_stdout("");
        let foreign = BaselineState::Foreign {
            type_name: "SubversionRevisionState".to_owned(),
        };

        scm(&backend, settings())
            .checkout(&build(dir.path()), Some(&foreign), None)
            .await
            .unwrap();

        let call = backend.last_invocation().unwrap();
        assert_eq!(call.command.get(ArgName::Baseline), None);
    }

    #[tokio::test]
    async fn test_checkout_changelog_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new().with_stdout("entry");
        let sink = dir.path().join("missing").join("changelog.txt");

        let err = scm(&backend, settings())
            .checkout(&build(dir.path()), None, Some(&sink))
            .await
            .unwrap_err();
        assert!(matches!(err, ScmError::ChangelogWrite { .. }));
    }

    #[tokio::test]
    async fn test_pinned_revision_skips_delegate() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new();
        let settings = settings().with_pinned(PinnedRevision::from_config(Some("deadbeef")));

        let state = scm(&backend, settings)
            .compute_revision_state(&build(dir.path()))
            .await
            .unwrap();

        assert_eq!(state, RevisionState::new("deadbeef"));
        assert_eq!(backend.invocation_count(), 0);
    }

    #[tokio::test]
    async fn test_identify_trims_reply() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new().with_stdout("  abc123\n");

        let state = scm(&backend, settings())
            .compute_revision_state(&build(dir.path()))
            .await
            .unwrap();

        assert_eq!(state.data(), "abc123");
        let call = backend.last_invocation().unwrap();
        assert_eq!(call.wire, vec!["COMMAND", "identify"]);
        assert_eq!(call.context.kind(), "workspace");
    }

    #[tokio::test]
    async fn test_poll_workspace_free_rejects_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new();

        let err = scm(&backend, settings())
            .poll(&JobContext::new("job"), Some(dir.path()), &token("r1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ScmError::ContractViolation(_)));
        assert_eq!(backend.invocation_count(), 0);
    }

    #[tokio::test]
    async fn test_poll_workspace_required_rejects_missing_workspace() {
        let backend = ScriptedBackend::new();
        let settings = settings().with_polling(PollingMode::WorkspaceRequired);

        let err = scm(&backend, settings)
            .poll(&JobContext::new("job"), None, &token("r1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ScmError::ContractViolation(_)));
        assert_eq!(backend.invocation_count(), 0);
    }

    #[tokio::test]
    async fn test_poll_workspace_free() {
        let backend =
            ScriptedBackend::new().with_stdout(compare_reply(ChangeKind::Significant, "r2"));
        let job = JobContext::new("job").with_env("CI", "1");

        let decision = scm(&backend, settings())
            .poll(&job, None, &token("r1"))
            .await
            .unwrap();

        assert_eq!(decision.change(), ChangeKind::Significant);
        assert_eq!(decision.baseline().data(), "r1");
        assert_eq!(decision.latest().data(), "r2");
        assert!(decision.has_changes());

        let call = backend.last_invocation().unwrap();
        assert_eq!(
            call.wire,
            vec!["COMMAND", "compare", "HEAD", "main", "BASELINE", "r1"]
        );
        assert_eq!(call.context.kind(), "local");
        assert_eq!(call.context.env().get("CI").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn test_poll_workspace_required() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new().with_stdout("NONE\n");
        let settings = settings()
            .with_polling(PollingMode::WorkspaceRequired)
            .with_pinned(PinnedRevision::from_config(Some("p1")));

        let decision = scm(&backend, settings)
            .poll(&JobContext::new("job"), Some(dir.path()), &token("r1"))
            .await
            .unwrap();

        assert_eq!(decision.change(), ChangeKind::None);
        assert!(decision.latest().is_unknown());
        let call = backend.last_invocation().unwrap();
        assert_eq!(call.context.root(), Some(dir.path()));
        assert_eq!(call.command.get(ArgName::Revision), Some("p1"));
    }

    #[tokio::test]
    async fn test_poll_malformed_reply_is_violation() {
        for reply in ["BOGUS\nabc", "abc123"] {
            let backend = ScriptedBackend::new().with_stdout(reply);
            let err = scm(&backend, settings())
                .poll(&JobContext::new("job"), None, &token("r1"))
                .await
                .unwrap_err();
            assert!(
                matches!(err, ScmError::ProtocolViolation(_)),
                "{reply:?} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_poll_foreign_baseline_unsupported() {
        let backend = ScriptedBackend::new();
        let foreign = BaselineState::Foreign {
            type_name: "GitRevisionState".to_owned(),
        };

        let err = scm(&backend, settings())
            .poll(&JobContext::new("job"), None, &foreign)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScmError::UnsupportedRevisionState { ref type_name } if type_name == "GitRevisionState"
        ));
        assert_eq!(backend.invocation_count(), 0);
    }

    #[tokio::test]
    async fn test_delegate_failure_surfaces() {
        let backend = ScriptedBackend::new().with_failure(2, "no such branch: main");

        let err = scm(&backend, settings())
            .poll(&JobContext::new("job"), None, &token("r1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ScmError::DelegateExecution(_)));
        assert!(err.to_string().contains("no such branch"));
    }

    #[tokio::test]
    async fn test_cancelled_poll() {
        let backend = ScriptedBackend::new().with_hang();
        let cancel = CancellationToken::new();
        let job = JobContext::new("job").with_cancellation(cancel.clone());
        let scm = scm(&backend, settings());

        let poll = tokio::spawn(async move { scm.poll(&job, None, &token("r1")).await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        cancel.cancel();

        let err = poll.await.unwrap().unwrap_err();
        assert!(matches!(err, ScmError::Cancelled));
    }

    #[test]
    fn test_identity_and_type() {
        let backend = ScriptedBackend::new();
        let scm = scm(&backend, settings());

        assert_eq!(scm.scm_type(), "userspace");
        assert_eq!(
            scm.key(),
            "userspace:registry.example/git-delegate%3A1:url=https%3A//example.invalid/repo.git:main"
        );
        assert!(!scm.requires_workspace_for_polling());
    }

    #[test]
    fn test_guess_browser() {
        let backend = ScriptedBackend::new();
        let base = Url::parse("https://scm.example/").unwrap();
        let scm = scm(&backend, settings().with_browser_base(Some(base)));

        let url = scm.guess_browser().revision_url("r1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://scm.example/registry.example%2Fgit-delegate:1/main/r1"
        );
    }

    #[test]
    fn test_parse_changelog_uses_configured_parser() {
        let backend = ScriptedBackend::new();
        let raw = b"Revision: r1\n\nfirst\n---\nsecond";

        let default = scm(&backend, settings()).parse_changelog("b7", raw).unwrap();
        assert_eq!(default.build_id, "b7");
        assert_eq!(default.len(), 2);

        let raw_scm = scm(&backend, settings()).with_changelog_parser(Arc::new(RawParser));
        assert_eq!(raw_scm.changelog_parser().name(), "raw");
        assert_eq!(raw_scm.parse_changelog("b7", raw).unwrap().len(), 1);
    }
}
