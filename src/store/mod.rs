//! Credential persistence boundary
//!
//! Sessions resume without repeating the initial handshake by persisting
//! opaque auth state between runs. The orchestrator only needs `load` and
//! `save`; what the material contains is the transport's business.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::identifiers::SessionId;

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

/// Opaque per-session authentication state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthState {
    /// Whether the account has completed its initial handshake
    ///
    /// Pairing codes are only requested while this is `false`.
    pub registered: bool,
    /// Credential material, opaque to the orchestrator
    #[serde(default)]
    pub material: serde_json::Value,
}

/// Store for per-session credential material
pub trait CredentialStore: Send + Sync + 'static {
    /// Load the auth state for a session
    ///
    /// Returns a fresh unregistered state when nothing has been persisted
    /// for the id yet.
    ///
    /// # Errors
    /// Returns error if persisted state exists but cannot be read
    fn load(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<AuthState>> + Send;

    /// Persist the auth state for a session
    ///
    /// # Errors
    /// Returns error if the state cannot be written
    fn save(
        &self,
        session_id: &SessionId,
        state: &AuthState,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
