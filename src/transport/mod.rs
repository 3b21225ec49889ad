//! Transport layer boundary
//!
//! The orchestrator treats the messaging network's wire protocol as an
//! opaque capability behind the [`Transport`] trait: given credentials it
//! opens a connection, yielding an exclusively owned handle plus a stream of
//! lifecycle and message events. Implementations live outside this crate;
//! the integration tests drive the orchestrator through a channel-backed
//! double.

use tokio::sync::mpsc;

use crate::error::Result;
use crate::store::AuthState;
use crate::types::identifiers::{Jid, SessionId};
use crate::types::session::{AuthMethod, UserProfile};

/// Reason attached to a transport close event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The account was explicitly logged out; the session must not reconnect
    LoggedOut,
    /// The remote closed the connection
    ConnectionClosed,
    /// The connection dropped without a close
    ConnectionLost,
    /// The connect handshake timed out
    TimedOut,
    /// The remote asked for a reconnect
    RestartRequired,
}

impl DisconnectReason {
    /// Whether the orchestrator should schedule a reconnect for this reason
    #[must_use]
    pub fn should_reconnect(self) -> bool {
        !matches!(self, Self::LoggedOut)
    }
}

/// Lifecycle and message events pushed by a live connection
///
/// One connection yields one event stream; events arrive in the order the
/// transport generated them.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A QR payload was issued for the initial handshake
    Qr(String),
    /// The connection is open and authenticated
    Open {
        /// Profile of the authenticated account
        user: UserProfile,
    },
    /// The connection closed
    Close {
        /// Why the connection closed
        reason: DisconnectReason,
    },
    /// The credential material changed and should be persisted
    CredsUpdated(AuthState),
    /// A message arrived on the connection
    MessageUpserted {
        /// Sender address
        from: Jid,
        /// Whether this session's own account sent it
        from_me: bool,
        /// Opaque message content
        payload: serde_json::Value,
        /// Network timestamp, seconds since the epoch
        timestamp: i64,
    },
}

/// Content of an outbound image send
#[derive(Debug, Clone, Default)]
pub struct ImageContent {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// Optional caption shown under the image
    pub caption: Option<String>,
    /// Optional MIME type, e.g. `image/jpeg`
    pub mime_type: Option<String>,
    /// Optional file name shown to the recipient
    pub filename: Option<String>,
}

/// Handle to a live connection, exclusively owned by its session's driver
pub trait TransportHandle: Send + Sync + 'static {
    /// Send a text message to a canonical recipient address
    ///
    /// # Errors
    /// Returns error if the transport rejects or fails the send
    fn send_text(
        &self,
        to: &Jid,
        text: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Send an image, with optional caption/MIME type/file name
    ///
    /// # Errors
    /// Returns error if the transport rejects or fails the send
    fn send_image(
        &self,
        to: &Jid,
        image: ImageContent,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Request a pairing code for a digits-only phone number
    ///
    /// # Errors
    /// Returns error if the network refuses to issue a code
    fn request_pairing_code(
        &self,
        phone: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Log the account out and close the connection
    ///
    /// # Errors
    /// Returns error if the logout could not be delivered
    fn logout(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Transport capability: opens authenticated connections
///
/// One `Transport` serves every session; each `open` call yields an
/// independent handle and event stream for one session.
pub trait Transport: Send + Sync + 'static {
    /// Connection handle type produced by this transport
    type Handle: TransportHandle;

    /// Open a connection with the given credentials
    ///
    /// The returned receiver yields the connection's [`TransportEvent`]s and
    /// closes when the connection is gone.
    ///
    /// # Errors
    /// Returns error if the connection cannot be established
    fn open(
        &self,
        session_id: &SessionId,
        auth: &AuthState,
        method: AuthMethod,
    ) -> impl std::future::Future<
        Output = Result<(Self::Handle, mpsc::UnboundedReceiver<TransportEvent>)>,
    > + Send;
}
