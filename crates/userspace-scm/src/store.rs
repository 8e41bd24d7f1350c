//! Per-build revision state persistence.
//!
//! The core never caches revision states itself. Hosts persist the state a
//! build produced and hand it back as the next build's baseline through a
//! [`RevisionStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use userspace_protocol::BaselineState;

use crate::error::{ScmError, ScmResult};

/// Saves and loads one baseline per build.
#[async_trait::async_trait]
pub trait RevisionStore: Send + Sync {
    /// Persist the state of `build_id`, replacing any previous one.
    async fn save(&self, build_id: &str, state: &BaselineState) -> ScmResult<()>;

    /// Load the state of `build_id`, if one was saved.
    async fn load(&self, build_id: &str) -> ScmResult<Option<BaselineState>>;
}

/// In-memory store for tests and short-lived hosts.
#[derive(Debug, Default)]
pub struct InMemoryRevisionStore {
    states: std::sync::RwLock<HashMap<String, BaselineState>>,
}

impl InMemoryRevisionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RevisionStore for InMemoryRevisionStore {
    async fn save(&self, build_id: &str, state: &BaselineState) -> ScmResult<()> {
        let mut states = self
            .states
            .write()
            .map_err(|_| ScmError::Store("revision store lock poisoned".to_owned()))?;
        states.insert(build_id.to_owned(), state.clone());
        Ok(())
    }

    async fn load(&self, build_id: &str) -> ScmResult<Option<BaselineState>> {
        let states = self
            .states
            .read()
            .map_err(|_| ScmError::Store("revision store lock poisoned".to_owned()))?;
        Ok(states.get(build_id).cloned())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    build_id: String,
    saved_at: DateTime<Utc>,
    state: BaselineState,
}

/// Stores each build's state as `<directory>/<build_id>.json`.
#[derive(Debug, Clone)]
pub struct FileRevisionStore {
    directory: PathBuf,
}

impl FileRevisionStore {
    /// Store files under `directory`, created on first save.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Directory holding the state files.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, build_id: &str) -> ScmResult<PathBuf> {
        let valid = !build_id.is_empty()
            && !build_id.starts_with('.')
            && build_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(ScmError::Store(format!("invalid build id: {build_id:?}")));
        }
        Ok(self.directory.join(format!("{build_id}.json")))
    }
}

#[async_trait::async_trait]
impl RevisionStore for FileRevisionStore {
    async fn save(&self, build_id: &str, state: &BaselineState) -> ScmResult<()> {
        let path = self.path_for(build_id)?;
        let record = StoredState {
            build_id: build_id.to_owned(),
            saved_at: Utc::now(),
            state: state.clone(),
        };
        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| ScmError::Store(format!("failed to encode state: {e}")))?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| {
                ScmError::Store(format!(
                    "failed to create {}: {e}",
                    self.directory.display()
                ))
            })?;

        // Write then rename so a reader never sees a partial file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| ScmError::Store(format!("failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| ScmError::Store(format!("failed to write {}: {e}", path.display())))?;

        debug!(build_id, path = %path.display(), "revision state saved");
        Ok(())
    }

    async fn load(&self, build_id: &str) -> ScmResult<Option<BaselineState>> {
        let path = self.path_for(build_id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ScmError::Store(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            },
        };
        let record: StoredState = serde_json::from_slice(&bytes)
            .map_err(|e| ScmError::Store(format!("failed to decode {}: {e}", path.display())))?;
        Ok(Some(record.state))
    }
}
