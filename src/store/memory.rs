//! In-memory credential store for tests and ephemeral sessions

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::types::identifiers::SessionId;

use super::{AuthState, CredentialStore};

/// Credential store that keeps auth state in a process-local map
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    states: Arc<Mutex<HashMap<SessionId, AuthState>>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a pre-registered state for a session
    pub fn seed(&self, session_id: SessionId, state: AuthState) {
        self.states.lock().insert(session_id, state);
    }

    /// Snapshot the stored state for a session, if any
    #[must_use]
    pub fn get(&self, session_id: &SessionId) -> Option<AuthState> {
        self.states.lock().get(session_id).cloned()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, session_id: &SessionId) -> Result<AuthState> {
        Ok(self
            .states
            .lock()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, session_id: &SessionId, state: &AuthState) -> Result<()> {
        self.states.lock().insert(session_id.clone(), state.clone());
        Ok(())
    }
}
