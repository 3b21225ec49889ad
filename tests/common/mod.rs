//! Shared test fixtures
//!
//! `ChannelTransport` is a scripted transport double: tests push
//! `TransportEvent`s into a session's stream and inspect what the
//! orchestrator asked the transport to do.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

use wamux::{
    AuthState, Event, ImageContent, Jid, MemoryCredentialStore, Result, SessionId,
    SessionManager, Transport, TransportEvent, TransportHandle, UserProfile, WamuxError,
};

/// A send the transport was asked to perform
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Sent {
    Text {
        session_id: String,
        to: String,
        text: String,
    },
    Image {
        session_id: String,
        to: String,
        caption: Option<String>,
        mime_type: Option<String>,
        filename: Option<String>,
        len: usize,
    },
}

#[derive(Default)]
struct TransportState {
    /// Event senders of live connections, keyed by session id
    event_txs: Mutex<HashMap<String, mpsc::UnboundedSender<TransportEvent>>>,
    opens: Mutex<Vec<String>>,
    sent: Mutex<Vec<Sent>>,
    pairing_requests: Mutex<Vec<String>>,
    logouts: Mutex<Vec<String>>,
    fail_opens: Mutex<bool>,
    fail_sends: Mutex<bool>,
    pairing_code: Mutex<String>,
}

/// Scripted transport double backed by per-session channels
#[derive(Clone, Default)]
pub struct ChannelTransport {
    state: Arc<TransportState>,
}

#[allow(dead_code)]
impl ChannelTransport {
    pub fn new() -> Self {
        let transport = Self::default();
        *transport.state.pairing_code.lock() = "ABCD-1234".to_string();
        transport
    }

    /// Push a transport event into a live connection's stream
    pub fn emit(&self, session_id: &str, event: TransportEvent) {
        let txs = self.state.event_txs.lock();
        let tx = txs
            .get(session_id)
            .unwrap_or_else(|| panic!("no live connection for {session_id}"));
        tx.send(event).expect("driver dropped its event stream");
    }

    /// Close a connection's event stream without a close event
    pub fn drop_stream(&self, session_id: &str) {
        self.state.event_txs.lock().remove(session_id);
    }

    pub fn open_count(&self, session_id: &str) -> usize {
        self.state
            .opens
            .lock()
            .iter()
            .filter(|id| id.as_str() == session_id)
            .count()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state.sent.lock().clone()
    }

    pub fn pairing_requests(&self) -> Vec<String> {
        self.state.pairing_requests.lock().clone()
    }

    pub fn logouts(&self) -> Vec<String> {
        self.state.logouts.lock().clone()
    }

    pub fn set_fail_opens(&self, fail: bool) {
        *self.state.fail_opens.lock() = fail;
    }

    pub fn set_fail_sends(&self, fail: bool) {
        *self.state.fail_sends.lock() = fail;
    }
}

pub struct ChannelHandle {
    session_id: String,
    state: Arc<TransportState>,
}

impl TransportHandle for ChannelHandle {
    async fn send_text(&self, to: &Jid, text: &str) -> Result<()> {
        if *self.state.fail_sends.lock() {
            return Err(WamuxError::transport("send rejected by test script"));
        }
        self.state.sent.lock().push(Sent::Text {
            session_id: self.session_id.clone(),
            to: to.as_str().to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_image(&self, to: &Jid, image: ImageContent) -> Result<()> {
        if *self.state.fail_sends.lock() {
            return Err(WamuxError::transport("send rejected by test script"));
        }
        self.state.sent.lock().push(Sent::Image {
            session_id: self.session_id.clone(),
            to: to.as_str().to_string(),
            caption: image.caption,
            mime_type: image.mime_type,
            filename: image.filename,
            len: image.bytes.len(),
        });
        Ok(())
    }

    async fn request_pairing_code(&self, phone: &str) -> Result<String> {
        self.state.pairing_requests.lock().push(phone.to_string());
        Ok(self.state.pairing_code.lock().clone())
    }

    async fn logout(&self) -> Result<()> {
        self.state.logouts.lock().push(self.session_id.clone());
        self.state.event_txs.lock().remove(&self.session_id);
        Ok(())
    }
}

impl Transport for ChannelTransport {
    type Handle = ChannelHandle;

    async fn open(
        &self,
        session_id: &SessionId,
        _auth: &AuthState,
        _method: wamux::AuthMethod,
    ) -> Result<(Self::Handle, mpsc::UnboundedReceiver<TransportEvent>)> {
        if *self.state.fail_opens.lock() {
            return Err(WamuxError::transport("open rejected by test script"));
        }
        self.state.opens.lock().push(session_id.as_str().to_string());

        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .event_txs
            .lock()
            .insert(session_id.as_str().to_string(), tx);

        let handle = ChannelHandle {
            session_id: session_id.as_str().to_string(),
            state: Arc::clone(&self.state),
        };
        Ok((handle, rx))
    }
}

/// Manager wired to a fresh `ChannelTransport` and in-memory store
pub fn manager() -> (
    SessionManager<ChannelTransport, MemoryCredentialStore>,
    ChannelTransport,
    MemoryCredentialStore,
) {
    let _ = env_logger::builder().is_test(true).try_init();
    let transport = ChannelTransport::new();
    let store = MemoryCredentialStore::new();
    let manager = SessionManager::new(transport.clone(), store.clone());
    (manager, transport, store)
}

/// Wait for the first event matching `pred`, skipping others
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<Event>, mut pred: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    panic!("event bus closed while waiting")
                }
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// A profile the test transport reports on open
#[allow(dead_code)]
pub fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        name: Some("Test Account".to_string()),
        extra: serde_json::Value::Null,
    }
}

/// Drive a created session all the way to connected
#[allow(dead_code)]
pub async fn connect(
    manager: &SessionManager<ChannelTransport, MemoryCredentialStore>,
    transport: &ChannelTransport,
    id: &str,
) {
    let mut events = manager.subscribe();
    manager
        .start_session(id, wamux::AuthMethod::Qr, None)
        .await
        .expect("start failed");
    transport.emit(
        id,
        TransportEvent::Open {
            user: profile(&format!("{id}@s.whatsapp.net")),
        },
    );
    wait_for(&mut events, |e| {
        matches!(
            e,
            Event::SessionStatus {
                status: wamux::SessionStatus::Connected,
                ..
            }
        )
    })
    .await;
}
