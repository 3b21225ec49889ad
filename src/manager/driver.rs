//! Per-session driver task
//!
//! Each started session gets one driver that exclusively owns the transport
//! handle. It reacts to two sources: commands from control calls and events
//! from the transport. Because all state transitions for a session happen
//! here, events for that session are published in generation order and no
//! other task ever mutates its connection-scoped fields.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::commands::SessionCommand;
use super::lifecycle::start_inner;
use super::session::SessionRecord;
use super::ManagerInner;
use crate::events::Event;
use crate::store::CredentialStore;
use crate::transport::{DisconnectReason, Transport, TransportEvent, TransportHandle};
use crate::types::session::{AuthMethod, SessionStatus};

/// Start parameters carried across reconnects
pub(super) struct DriverParams {
    pub method: AuthMethod,
    pub phone_number: Option<String>,
}

/// Spawn the background task driving one session's connection
///
/// The task runs until the connection closes, an explicit logout or
/// teardown command arrives, or the transport's event stream ends.
pub(super) fn spawn_driver<T: Transport, C: CredentialStore>(
    inner: Arc<ManagerInner<T, C>>,
    record: SessionRecord,
    handle: T::Handle,
    mut events_rx: mpsc::UnboundedReceiver<TransportEvent>,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    params: DriverParams,
) {
    tokio::spawn(async move {
        let id = record.id.clone();
        loop {
            tokio::select! {
                Some(cmd) = command_rx.recv() => {
                    match cmd {
                        SessionCommand::SendText { to, text, response_tx } => {
                            let result = handle.send_text(&to, &text).await;
                            let _ = response_tx.send(result);
                        }
                        SessionCommand::SendImage { to, image, response_tx } => {
                            let result = handle.send_image(&to, image).await;
                            let _ = response_tx.send(result);
                        }
                        SessionCommand::RequestPairingCode { phone } => {
                            match handle.request_pairing_code(&phone).await {
                                Ok(code) => {
                                    *record.status.lock().await = SessionStatus::PairingPending;
                                    log::info!("[{id}] pairing code issued");
                                    inner.events.publish(Event::PairingCode {
                                        session_id: id.clone(),
                                        code,
                                    });
                                }
                                Err(e) => {
                                    log::error!("[{id}] pairing code request failed: {e}");
                                    inner.events.publish(Event::Error {
                                        session_id: Some(id.clone()),
                                        message: e.to_string(),
                                    });
                                }
                            }
                        }
                        SessionCommand::Logout { response_tx } => {
                            let result = handle.logout().await;
                            record.clear_connection().await;
                            *record.status.lock().await = SessionStatus::Disconnected;
                            log::info!("[{id}] logged out");
                            inner.events.publish(Event::SessionStatus {
                                session_id: id.clone(),
                                status: SessionStatus::Disconnected,
                                user: None,
                            });
                            let _ = response_tx.send(result);
                            break;
                        }
                        SessionCommand::Shutdown { response_tx } => {
                            if let Err(e) = handle.logout().await {
                                log::warn!("[{id}] logout during teardown failed: {e}");
                            }
                            record.clear_connection().await;
                            *record.status.lock().await = SessionStatus::Disconnected;
                            let _ = response_tx.send(());
                            break;
                        }
                    }
                }
                event = events_rx.recv() => {
                    let Some(event) = event else {
                        // Stream ended without a close event: treat as a
                        // lost connection.
                        log::warn!("[{id}] transport event stream ended");
                        handle_close(&inner, &record, DisconnectReason::ConnectionLost, &params)
                            .await;
                        break;
                    };
                    match event {
                        TransportEvent::Qr(payload) => {
                            if params.method == AuthMethod::Qr {
                                *record.status.lock().await = SessionStatus::QrPending;
                                *record.qr_payload.lock().await = Some(payload.clone());
                                log::info!("[{id}] QR code generated");
                                inner.events.publish(Event::Qr {
                                    session_id: id.clone(),
                                    payload,
                                });
                            }
                        }
                        TransportEvent::Open { user } => {
                            *record.status.lock().await = SessionStatus::Connected;
                            *record.qr_payload.lock().await = None;
                            *record.user.lock().await = Some(user.clone());
                            *record.reconnect_attempts.lock().await = 0;
                            log::info!("[{id}] connected as {}", user.id);
                            inner.events.publish(Event::SessionStatus {
                                session_id: id.clone(),
                                status: SessionStatus::Connected,
                                user: Some(user),
                            });
                        }
                        TransportEvent::Close { reason } => {
                            handle_close(&inner, &record, reason, &params).await;
                            break;
                        }
                        TransportEvent::CredsUpdated(state) => {
                            // Best effort: a failed save must not take the
                            // connection down.
                            if let Err(e) = inner.store.save(&id, &state).await {
                                log::warn!("[{id}] failed to persist credentials: {e}");
                            }
                        }
                        TransportEvent::MessageUpserted { from, from_me, payload, timestamp } => {
                            if !from_me && !payload.is_null() {
                                inner.events.publish(Event::MessageReceived {
                                    session_id: id.clone(),
                                    from,
                                    payload,
                                    timestamp,
                                });
                            }
                        }
                    }
                }
            }
        }
    });
}

/// Handle a connection close, deciding between terminal logout and reconnect
async fn handle_close<T: Transport, C: CredentialStore>(
    inner: &Arc<ManagerInner<T, C>>,
    record: &SessionRecord,
    reason: DisconnectReason,
    params: &DriverParams,
) {
    let id = record.id.clone();
    record.clear_connection().await;

    if !reason.should_reconnect() {
        // Logged out is terminal; the surface reports it as disconnected.
        *record.status.lock().await = SessionStatus::LoggedOut;
        log::info!("[{id}] logged out by remote");
        inner.events.publish(Event::SessionStatus {
            session_id: id,
            status: SessionStatus::Disconnected,
            user: None,
        });
        return;
    }

    let attempt = *record.reconnect_attempts.lock().await + 1;
    if inner.reconnect.is_exhausted(attempt) {
        *record.status.lock().await = SessionStatus::Disconnected;
        log::error!("[{id}] giving up after {} reconnect attempts", attempt - 1);
        inner.events.publish(Event::SessionStatus {
            session_id: id.clone(),
            status: SessionStatus::Disconnected,
            user: None,
        });
        inner.events.publish(Event::Error {
            session_id: Some(id),
            message: "reconnect attempts exhausted".to_string(),
        });
        return;
    }
    *record.reconnect_attempts.lock().await = attempt;

    *record.status.lock().await = SessionStatus::Reconnecting;
    inner.events.publish(Event::SessionStatus {
        session_id: id.clone(),
        status: SessionStatus::Reconnecting,
        user: None,
    });

    let delay = inner.reconnect.delay_for_attempt(attempt);
    log::info!(
        "[{id}] connection closed ({reason:?}), reconnecting in {}ms (attempt {attempt})",
        delay.as_millis()
    );

    let inner = Arc::clone(inner);
    let method = params.method;
    let phone_number = params.phone_number.clone();
    let timer_id = id.clone();
    let timer = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // The session may have been deleted while the timer ran.
        if !inner.contains(&timer_id) {
            return;
        }
        if let Err(e) = start_inner(inner, timer_id.clone(), method, phone_number).await {
            log::error!("[{timer_id}] reconnect attempt failed: {e}");
        }
    });
    *record.reconnect_timer.lock().await = Some(timer);
}
