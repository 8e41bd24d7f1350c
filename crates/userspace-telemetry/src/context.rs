//! Operation context for correlating log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one host-level SCM operation.
///
/// Everything logged inside [`OperationContext::span`] carries the
/// invocation id, so a checkout's delegate output can be matched to the
/// build that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Unique id of this invocation.
    pub invocation_id: Uuid,
    /// `checkout`, `identify`, `poll`, ...
    pub operation: String,
    /// When the operation started.
    pub started_at: DateTime<Utc>,
    /// Identity key of the SCM configuration.
    pub scm_key: Option<String>,
    /// Build the operation belongs to.
    pub build_id: Option<String>,
    /// Job being polled.
    pub job: Option<String>,
}

impl OperationContext {
    /// Start a context for `operation`.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            operation: operation.into(),
            started_at: Utc::now(),
            scm_key: None,
            build_id: None,
            job: None,
        }
    }

    /// Set the SCM identity key.
    #[must_use]
    pub fn with_scm_key(mut self, key: impl Into<String>) -> Self {
        self.scm_key = Some(key.into());
        self
    }

    /// Set the build id.
    #[must_use]
    pub fn with_build_id(mut self, build_id: impl Into<String>) -> Self {
        self.build_id = Some(build_id.into());
        self
    }

    /// Set the job name.
    #[must_use]
    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Time since the operation started.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.started_at)
    }

    /// Elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        self.elapsed().num_milliseconds()
    }

    /// First eight hex digits of the invocation id.
    #[must_use]
    pub fn short_id(&self) -> String {
        let mut id = self.invocation_id.simple().to_string();
        id.truncate(8);
        id
    }

    /// Span carrying this context's fields.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "scm_operation",
            invocation_id = %self.short_id(),
            operation = %self.operation,
            scm_key = self.scm_key.as_deref(),
            build_id = self.build_id.as_deref(),
            job = self.job.as_deref(),
        )
    }

    /// Enter the span until the returned guard is dropped.
    #[must_use]
    pub fn enter(self) -> OperationGuard {
        OperationGuard::new(self)
    }
}

/// Keeps an operation's span entered and logs completion on drop.
///
/// Entering a span across `.await` points is only sound on the current
/// thread; async callers should prefer `Instrument` with
/// [`OperationContext::span`].
pub struct OperationGuard {
    context: OperationContext,
    /// Held to keep the span active until the guard is dropped.
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl OperationGuard {
    /// Enter the context's span.
    #[must_use]
    pub fn new(context: OperationContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("operation started");
        Self { context, span }
    }

    /// The guarded context.
    #[must_use]
    pub fn context(&self) -> &OperationContext {
        &self.context
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "operation finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = OperationContext::new("poll")
            .with_scm_key("userspace:img:cfg:main")
            .with_job("nightly");

        assert_eq!(ctx.operation, "poll");
        assert_eq!(ctx.scm_key.as_deref(), Some("userspace:img:cfg:main"));
        assert_eq!(ctx.job.as_deref(), Some("nightly"));
        assert!(ctx.build_id.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = OperationContext::new("checkout");
        let b = OperationContext::new("checkout");
        assert_ne!(a.invocation_id, b.invocation_id);
    }

    #[test]
    fn test_short_id() {
        let ctx = OperationContext::new("identify");
        let short = ctx.short_id();
        assert_eq!(short.len(), 8);
        assert!(ctx.invocation_id.simple().to_string().starts_with(&short));
    }

    #[test]
    fn test_elapsed() {
        let ctx = OperationContext::new("checkout");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(ctx.elapsed_ms() >= 10);
    }

    #[test]
    fn test_guard_keeps_context() {
        let guard = OperationContext::new("checkout").with_build_id("b1").enter();
        assert_eq!(guard.context().build_id.as_deref(), Some("b1"));
    }

    #[test]
    fn test_serialization() {
        let ctx = OperationContext::new("poll").with_job("nightly");
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"operation\":\"poll\""));

        let parsed: OperationContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.invocation_id, ctx.invocation_id);
        assert_eq!(parsed.job.as_deref(), Some("nightly"));
    }
}
