//! Session command protocol
//!
//! Control calls never touch the transport handle directly; the driver task
//! owns it exclusively, and these commands reach the driver via its channel.
//! Oneshot reply channels carry the per-call acknowledgement back to the
//! requester.

use tokio::sync::oneshot;

use crate::error::Result;
use crate::transport::ImageContent;
use crate::types::identifiers::Jid;

/// Commands that can be sent to a session's driver task
pub(crate) enum SessionCommand {
    /// Send a text message through the live connection
    SendText {
        /// Canonical recipient address
        to: Jid,
        /// Message body
        text: String,
        /// Channel to send the operation result back
        response_tx: oneshot::Sender<Result<()>>,
    },

    /// Send an image through the live connection
    SendImage {
        /// Canonical recipient address
        to: Jid,
        /// Image bytes plus optional caption/MIME type/file name
        image: ImageContent,
        /// Channel to send the operation result back
        response_tx: oneshot::Sender<Result<()>>,
    },

    /// Request a pairing code for an unregistered account
    ///
    /// The driver publishes the code (or a scoped error) as an event; there
    /// is no direct reply.
    RequestPairingCode {
        /// Digits-only phone number
        phone: String,
    },

    /// Log the account out and stop the driver; no reconnect follows
    Logout {
        /// Channel to send the logout result back
        response_tx: oneshot::Sender<Result<()>>,
    },

    /// Tear the connection down ahead of record removal
    ///
    /// Best-effort logout; the driver always stops and confirms.
    Shutdown {
        /// Channel to confirm teardown completion
        response_tx: oneshot::Sender<()>,
    },
}
