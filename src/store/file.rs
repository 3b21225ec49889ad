//! File-backed credential store
//!
//! One JSON file per session under a root directory, the moral equivalent of
//! the usual auth-folder-per-account layout.

use std::path::{Path, PathBuf};

use crate::error::{Result, WamuxError};
use crate::types::identifiers::SessionId;

use super::{AuthState, CredentialStore};

/// Credential store keeping one `<id>.json` file per session
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    root: PathBuf,
}

impl FileCredentialStore {
    /// Create a store rooted at the given directory
    ///
    /// The directory is created lazily on the first `save`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, session_id: &SessionId) -> PathBuf {
        // SessionId validation forbids path separators, so joining is safe.
        self.root.join(format!("{session_id}.json"))
    }

    /// Root directory of the store
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CredentialStore for FileCredentialStore {
    async fn load(&self, session_id: &SessionId) -> Result<AuthState> {
        let path = self.path_for(session_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                WamuxError::persistence(format!(
                    "corrupt auth state at {}: {e}",
                    path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AuthState::default()),
            Err(e) => Err(WamuxError::persistence(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn save(&self, session_id: &SessionId, state: &AuthState) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            WamuxError::persistence(format!(
                "failed to create {}: {e}",
                self.root.display()
            ))
        })?;

        let path = self.path_for(session_id);
        let bytes = serde_json::to_vec_pretty(state)?;

        // Write-then-rename so a crash mid-save never truncates good state;
        // the unique suffix keeps concurrent saves from clobbering each
        // other's temp file.
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, &bytes).await.map_err(|e| {
            WamuxError::persistence(format!("failed to write {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            WamuxError::persistence(format!("failed to rename {}: {e}", tmp.display()))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_returns_fresh_state_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());
        let state = store.load(&SessionId::parse("s1").unwrap()).await.unwrap();
        assert!(!state.registered);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("auth"));
        let id = SessionId::parse("s1").unwrap();

        let state = AuthState {
            registered: true,
            material: serde_json::json!({"noise_key": "abc"}),
        };
        store.save(&id, &state).await.unwrap();

        let loaded = store.load(&id).await.unwrap();
        assert!(loaded.registered);
        assert_eq!(loaded.material["noise_key"], "abc");
    }
}
