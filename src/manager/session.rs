//! Session record state structures
//!
//! A record's mutable cells are shared between the registry map and the
//! session's driver task. By convention only the owning driver (and the
//! control calls that claim the command slot) mutate them; the registry lock
//! covers map membership, not field state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use super::commands::SessionCommand;
use crate::types::identifiers::SessionId;
use crate::types::session::{AuthMethod, SessionSnapshot, SessionStatus, UserProfile};

/// One logical account's connection state
///
/// The command-channel slot doubles as the "connection handle exists"
/// marker: it is `Some` exactly while a driver task owns a live transport
/// handle (any of connecting / qr_pending / pairing_pending / connected /
/// reconnecting-before-close states).
#[derive(Clone)]
pub(crate) struct SessionRecord {
    /// Unique session identifier, immutable once created
    pub id: SessionId,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// Current connection status
    pub status: Arc<Mutex<SessionStatus>>,

    /// Auth method, set at the first `start`
    pub auth_method: Arc<Mutex<Option<AuthMethod>>>,

    /// Phone number supplied for pairing auth
    pub phone_number: Arc<Mutex<Option<String>>>,

    /// QR payload, present only while the status is qr_pending
    pub qr_payload: Arc<Mutex<Option<String>>>,

    /// Authenticated account profile, present while connected
    pub user: Arc<Mutex<Option<UserProfile>>>,

    /// Command channel into the driver task; `Some` iff a handle exists
    pub command_tx: Arc<Mutex<Option<mpsc::UnboundedSender<SessionCommand>>>>,

    /// Pending deferred-reconnect task, abortable
    pub reconnect_timer: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Consecutive reconnect attempts since the last successful open
    pub reconnect_attempts: Arc<Mutex<u32>>,
}

impl SessionRecord {
    /// Create a fresh uninitialized record
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            status: Arc::new(Mutex::new(SessionStatus::Uninitialized)),
            auth_method: Arc::new(Mutex::new(None)),
            phone_number: Arc::new(Mutex::new(None)),
            qr_payload: Arc::new(Mutex::new(None)),
            user: Arc::new(Mutex::new(None)),
            command_tx: Arc::new(Mutex::new(None)),
            reconnect_timer: Arc::new(Mutex::new(None)),
            reconnect_attempts: Arc::new(Mutex::new(0)),
        }
    }

    /// External projection of the record
    ///
    /// The command channel and QR payload never leave the component.
    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            status: *self.status.lock().await,
            auth_method: *self.auth_method.lock().await,
            phone_number: self.phone_number.lock().await.clone(),
            user: self.user.lock().await.clone(),
            created_at: self.created_at,
        }
    }

    /// Drop the connection marker and connection-scoped fields
    ///
    /// Called by the driver on every path out of an active connection.
    pub async fn clear_connection(&self) {
        *self.command_tx.lock().await = None;
        *self.qr_payload.lock().await = None;
        *self.user.lock().await = None;
    }

    /// Abort a pending deferred reconnect, if one is scheduled
    pub async fn cancel_reconnect(&self) {
        if let Some(timer) = self.reconnect_timer.lock().await.take() {
            timer.abort();
        }
    }
}
