//! Connection lifecycle control calls
//!
//! `start_session` claims a session's command slot, opens the transport, and
//! hands the connection to a driver task; `logout_session` tears a live
//! connection down explicitly. The slot claim is what serializes concurrent
//! control calls on one id: whoever holds the slot mutex first wins, and
//! everyone after sees the claim and is rejected.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::commands::SessionCommand;
use super::driver::{spawn_driver, DriverParams};
use super::{ManagerInner, SessionManager};
use crate::error::{Result, WamuxError};
use crate::events::Event;
use crate::store::CredentialStore;
use crate::transport::Transport;
use crate::types::identifiers::{digits_only, SessionId};
use crate::types::session::{AuthMethod, SessionStatus};

impl<T: Transport, C: CredentialStore> SessionManager<T, C> {
    /// Start a session's connection with the given auth method
    ///
    /// Creates the session if the id is not yet registered. Loads
    /// credentials, opens a transport connection, and spawns the driver task
    /// that owns the handle from then on. For pairing auth against
    /// unregistered credentials, a pairing code is requested and published
    /// as [`Event::PairingCode`].
    ///
    /// # Errors
    /// - [`WamuxError::Validation`] for a malformed id, or pairing auth
    ///   without a phone number
    /// - [`WamuxError::AlreadyConnected`] if the session is connected
    /// - [`WamuxError::AlreadyInProgress`] if a connection attempt is
    ///   already in flight
    /// - [`WamuxError::Transport`] / [`WamuxError::Persistence`] when
    ///   opening the connection fails
    pub async fn start_session(
        &self,
        id: &str,
        method: AuthMethod,
        phone_number: Option<String>,
    ) -> Result<()> {
        let id = SessionId::parse(id)?;
        start_inner(Arc::clone(&self.inner), id, method, phone_number).await
    }

    /// Log a session out explicitly
    ///
    /// Instructs the transport to log out, clears the connection-scoped
    /// fields, sets the status to disconnected, and publishes it. An
    /// explicit logout never schedules a reconnect. Calling this on a
    /// session without a live connection is a no-op success, matching the
    /// permissive control surface this replaces.
    ///
    /// # Errors
    /// Returns [`WamuxError::Validation`] for a malformed id, or the
    /// transport's error when the logout itself fails.
    pub async fn logout_session(&self, id: &str) -> Result<()> {
        let id = SessionId::parse(id)?;
        let Some(record) = self.inner.get(&id) else {
            return Ok(());
        };

        record.cancel_reconnect().await;

        let command_tx = record.command_tx.lock().await.clone();
        let Some(tx) = command_tx else {
            // No live connection; a cancelled reconnect still needs its
            // status settled.
            let mut status = record.status.lock().await;
            if *status == SessionStatus::Reconnecting {
                *status = SessionStatus::Disconnected;
                drop(status);
                self.inner.events.publish(Event::SessionStatus {
                    session_id: id.clone(),
                    status: SessionStatus::Disconnected,
                    user: None,
                });
            }
            return Ok(());
        };

        let (response_tx, response_rx) = oneshot::channel();
        if tx.send(SessionCommand::Logout { response_tx }).is_err() {
            return Ok(());
        }
        match response_rx.await {
            Ok(result) => result,
            // Driver went away mid-logout; the connection is gone either way.
            Err(_) => Ok(()),
        }
    }
}

/// Start implementation shared by control calls and deferred reconnects
pub(super) async fn start_inner<T: Transport, C: CredentialStore>(
    inner: Arc<ManagerInner<T, C>>,
    id: SessionId,
    method: AuthMethod,
    phone_number: Option<String>,
) -> Result<()> {
    if method == AuthMethod::Pairing && phone_number.is_none() {
        return Err(WamuxError::validation(
            "pairing auth requires a phone number",
        ));
    }

    let (record, created) = inner.get_or_create(&id);
    if created {
        log::info!("[{id}] session created implicitly by start");
    }

    // Claim the command slot. Holding the slot mutex over the check and the
    // claim is the at-most-one-attempt guarantee; no await happens inside.
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    {
        let mut slot = record.command_tx.lock().await;
        if slot.is_some() {
            if *record.status.lock().await == SessionStatus::Connected {
                return Err(WamuxError::already_connected(id.as_str()));
            }
            return Err(WamuxError::already_in_progress(id.as_str()));
        }
        *slot = Some(command_tx.clone());
    }

    *record.auth_method.lock().await = Some(method);
    *record.phone_number.lock().await = phone_number.clone();
    *record.status.lock().await = SessionStatus::Connecting;
    log::info!("[{id}] connecting ({method:?})");

    let opened = async {
        let auth = inner.store.load(&id).await?;
        let (handle, events_rx) = inner.transport.open(&id, &auth, method).await?;
        Ok::<_, WamuxError>((auth, handle, events_rx))
    }
    .await;

    let (auth, handle, events_rx) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            // Roll the claim back so a later start can try again.
            *record.command_tx.lock().await = None;
            *record.status.lock().await = SessionStatus::Disconnected;
            log::error!("[{id}] connect failed: {e}");
            inner.events.publish(Event::Error {
                session_id: Some(id.clone()),
                message: e.to_string(),
            });
            return Err(e);
        }
    };

    spawn_driver(
        Arc::clone(&inner),
        record,
        handle,
        events_rx,
        command_rx,
        DriverParams {
            method,
            phone_number: phone_number.clone(),
        },
    );

    // The handle now lives in the driver, so the pairing-code request goes
    // through the command channel like every other handle operation.
    if method == AuthMethod::Pairing
        && !auth.registered
        && let Some(phone) = phone_number
    {
        let _ = command_tx.send(SessionCommand::RequestPairingCode {
            phone: digits_only(&phone),
        });
    }

    Ok(())
}
