//! Message dispatch through connected sessions
//!
//! Validates the target session, normalizes the recipient, and routes the
//! send through the session's driver. Sends fail fast before any transport
//! call when the session is missing or not connected.

use tokio::sync::{mpsc, oneshot};

use super::commands::SessionCommand;
use super::session::SessionRecord;
use super::SessionManager;
use crate::error::{Result, WamuxError};
use crate::events::Event;
use crate::store::CredentialStore;
use crate::transport::{ImageContent, Transport};
use crate::types::identifiers::{Jid, SessionId};
use crate::types::session::SessionStatus;

impl<T: Transport, C: CredentialStore> SessionManager<T, C> {
    /// Send a text message from a connected session
    ///
    /// The recipient is normalized to canonical address form. Success
    /// publishes [`Event::MessageSent`]; a transport failure publishes a
    /// scoped [`Event::Error`] and surfaces as
    /// [`WamuxError::SendFailure`].
    ///
    /// # Errors
    /// - [`WamuxError::Validation`] for a malformed id or recipient
    /// - [`WamuxError::NotConnected`] if the session is missing or not
    ///   connected (no transport call is made)
    /// - [`WamuxError::SendFailure`] when the transport send fails
    pub async fn send_text(&self, id: &str, recipient: &str, text: &str) -> Result<()> {
        let id = SessionId::parse(id)?;
        let to = Jid::normalize(recipient)?;
        let tx = self.connected_sender(&id).await?;

        let (response_tx, response_rx) = oneshot::channel();
        let cmd = SessionCommand::SendText {
            to: to.clone(),
            text: text.to_string(),
            response_tx,
        };
        self.deliver(&id, &to, tx, cmd, response_rx).await?;

        log::debug!("[{id}] message sent to {to}");
        self.inner.events.publish(Event::MessageSent {
            session_id: id,
            to,
        });
        Ok(())
    }

    /// Send an image from a connected session
    ///
    /// Same preconditions and normalization as [`send_text`]. Success
    /// publishes [`Event::ImageSent`] followed by [`Event::MessageSent`],
    /// matching the control surface this replaces.
    ///
    /// # Errors
    /// See [`send_text`].
    ///
    /// [`send_text`]: Self::send_text
    pub async fn send_image(&self, id: &str, recipient: &str, image: ImageContent) -> Result<()> {
        let id = SessionId::parse(id)?;
        let to = Jid::normalize(recipient)?;
        let tx = self.connected_sender(&id).await?;

        log::debug!("[{id}] sending image to {to} ({} bytes)", image.bytes.len());
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = SessionCommand::SendImage {
            to: to.clone(),
            image,
            response_tx,
        };
        self.deliver(&id, &to, tx, cmd, response_rx).await?;

        self.inner.events.publish(Event::ImageSent {
            session_id: id.clone(),
            to: to.clone(),
        });
        self.inner.events.publish(Event::MessageSent {
            session_id: id,
            to,
        });
        Ok(())
    }

    /// Resolve the command sender of a session that must be connected
    async fn connected_sender(
        &self,
        id: &SessionId,
    ) -> Result<mpsc::UnboundedSender<SessionCommand>> {
        let record: SessionRecord = self
            .inner
            .get(id)
            .ok_or_else(|| WamuxError::not_connected(id.as_str()))?;

        let slot = record.command_tx.lock().await;
        if *record.status.lock().await != SessionStatus::Connected {
            return Err(WamuxError::not_connected(id.as_str()));
        }
        slot.clone()
            .ok_or_else(|| WamuxError::not_connected(id.as_str()))
    }

    /// Round-trip a send command through the driver and map the outcome
    async fn deliver(
        &self,
        id: &SessionId,
        to: &Jid,
        tx: mpsc::UnboundedSender<SessionCommand>,
        cmd: SessionCommand,
        response_rx: oneshot::Receiver<Result<()>>,
    ) -> Result<()> {
        if tx.send(cmd).is_err() {
            // Driver already gone; the connection closed under us.
            return Err(WamuxError::not_connected(id.as_str()));
        }
        match response_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                let failure =
                    WamuxError::send_failure(id.as_str(), to.as_str(), e.to_string());
                log::error!("[{id}] send to {to} failed: {e}");
                self.inner.events.publish(Event::Error {
                    session_id: Some(id.clone()),
                    message: failure.to_string(),
                });
                Err(failure)
            }
            Err(_) => Err(WamuxError::not_connected(id.as_str())),
        }
    }
}
