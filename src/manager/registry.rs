//! Session registry operations
//!
//! Create, inspect, list, and delete session records. Structural changes to
//! the registry map take its lock; per-session state never does.

use tokio::sync::oneshot;

use super::commands::SessionCommand;
use super::SessionManager;
use crate::error::{Result, WamuxError};
use crate::events::Event;
use crate::store::CredentialStore;
use crate::transport::Transport;
use crate::types::identifiers::SessionId;
use crate::types::session::SessionSnapshot;

impl<T: Transport, C: CredentialStore> SessionManager<T, C> {
    /// Register a session id, idempotently
    ///
    /// Returns the existing session's snapshot if the id is already
    /// registered; existing state is never overwritten. A new registration
    /// publishes a fresh [`Event::AllSessions`] membership snapshot.
    ///
    /// # Errors
    /// Returns [`WamuxError::Validation`] for a malformed id.
    pub async fn create_session(&self, id: &str) -> Result<SessionSnapshot> {
        let id = SessionId::parse(id)?;
        let (record, created) = self.inner.get_or_create(&id);
        if created {
            log::info!("[{id}] session created");
            self.publish_all_sessions().await;
        }
        Ok(record.snapshot().await)
    }

    /// Look up a session's snapshot
    ///
    /// # Errors
    /// Returns [`WamuxError::SessionNotFound`] for an unknown id.
    pub async fn get_session(&self, id: &str) -> Result<SessionSnapshot> {
        let id = SessionId::parse(id)?;
        let record = self
            .inner
            .get(&id)
            .ok_or_else(|| WamuxError::session_not_found(id.as_str()))?;
        Ok(record.snapshot().await)
    }

    /// Snapshot every registered session
    ///
    /// The projection excludes connection handles and QR payloads.
    pub async fn list_sessions(&self) -> Vec<SessionSnapshot> {
        let records: Vec<_> = self.inner.registry.read().values().cloned().collect();
        let mut snapshots = Vec::with_capacity(records.len());
        for record in records {
            snapshots.push(record.snapshot().await);
        }
        snapshots
    }

    /// Remove a session, releasing its connection first
    ///
    /// Cancels any pending reconnect, tears down an active connection (the
    /// teardown logs the account out), then removes the record and publishes
    /// the new membership snapshot. Deleting an unknown id is a no-op
    /// success.
    ///
    /// # Errors
    /// Returns [`WamuxError::Validation`] for a malformed id.
    pub async fn delete_session(&self, id: &str) -> Result<()> {
        let id = SessionId::parse(id)?;
        let Some(record) = self.inner.get(&id) else {
            return Ok(());
        };

        // Cancel the timer before teardown so no restart fires for an id
        // that is about to disappear.
        record.cancel_reconnect().await;

        let command_tx = record.command_tx.lock().await.clone();
        if let Some(tx) = command_tx {
            let (response_tx, response_rx) = oneshot::channel();
            if tx.send(SessionCommand::Shutdown { response_tx }).is_ok() {
                let _ = response_rx.await;
            }
        }

        self.inner.registry.write().remove(&id);
        log::info!("[{id}] session deleted");
        self.publish_all_sessions().await;
        Ok(())
    }

    pub(super) async fn publish_all_sessions(&self) {
        let sessions = self.list_sessions().await;
        self.inner.events.publish(Event::AllSessions { sessions });
    }
}
