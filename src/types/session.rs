//! Session state vocabulary
//!
//! Status and auth-method enums plus the externally visible snapshot
//! projection of a session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::SessionId;

/// Authentication method chosen at the first `start` of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Scannable, time-limited QR code handshake
    Qr,
    /// Phone-number-derived short pairing code handshake
    Pairing,
}

/// Connection status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    /// Created but never started
    Uninitialized,
    /// Transport connect in flight
    Connecting,
    /// Waiting for the QR code to be scanned
    QrPending,
    /// Waiting for the pairing code to be entered
    PairingPending,
    /// Live authenticated connection
    Connected,
    /// Connection dropped, a deferred restart is scheduled
    Reconnecting,
    /// No connection and no restart scheduled
    Disconnected,
    /// Explicitly logged out by the remote; terminal, never reconnects
    LoggedOut,
}

impl SessionStatus {
    /// Whether a connection handle exists in this status
    #[must_use]
    pub fn has_handle(self) -> bool {
        matches!(
            self,
            Self::Connecting
                | Self::QrPending
                | Self::PairingPending
                | Self::Connected
                | Self::Reconnecting
        )
    }
}

/// Profile of the authenticated account, set when the connection opens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account jid on the network
    pub id: String,
    /// Display name, when the network reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remaining profile fields, kept opaque
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

impl UserProfile {
    /// Create a profile with just an account id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            extra: serde_json::Value::Null,
        }
    }
}

/// External projection of a session record
///
/// Used for reporting over the control surface. The live connection handle
/// and the QR payload are deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session id
    pub id: SessionId,
    /// Current connection status
    pub status: SessionStatus,
    /// Auth method, once a `start` has set it
    pub auth_method: Option<AuthMethod>,
    /// Phone number supplied for pairing auth
    pub phone_number: Option<String>,
    /// Authenticated account profile while connected
    pub user: Option<UserProfile>,
    /// Creation time of the record
    pub created_at: DateTime<Utc>,
}
