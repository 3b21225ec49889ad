//! Event fan-out
//!
//! All sessions publish into one broadcast channel; every subscriber sees
//! every event. Events produced by a single session come out of that
//! session's driver task and therefore arrive in generation order. Nothing
//! is guaranteed about interleaving across sessions.
//!
//! Acknowledgements for individual control calls are *not* events: they are
//! the `Result` values the control methods return to their caller.

use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::types::identifiers::{Jid, SessionId};
use crate::types::session::{SessionSnapshot, SessionStatus, UserProfile};

/// Default capacity of the broadcast channel
const DEFAULT_CAPACITY: usize = 256;

/// Events published to all subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    /// A QR payload is ready to be scanned
    Qr {
        /// Session awaiting the scan
        session_id: SessionId,
        /// QR payload to render
        payload: String,
    },
    /// A pairing code was issued
    PairingCode {
        /// Session awaiting the pairing
        session_id: SessionId,
        /// Short code to enter on the phone
        code: String,
    },
    /// A session changed connection status
    SessionStatus {
        /// Session whose status changed
        session_id: SessionId,
        /// New status
        status: SessionStatus,
        /// Account profile, present when the status is connected
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<UserProfile>,
    },
    /// An inbound message arrived on a connected session
    MessageReceived {
        /// Session the message arrived on
        session_id: SessionId,
        /// Sender address
        from: Jid,
        /// Opaque message content
        payload: serde_json::Value,
        /// Network timestamp, seconds since the epoch
        timestamp: i64,
    },
    /// A text send completed
    MessageSent {
        /// Session the message was sent from
        session_id: SessionId,
        /// Canonical recipient address
        to: Jid,
    },
    /// An image send completed
    ImageSent {
        /// Session the image was sent from
        session_id: SessionId,
        /// Canonical recipient address
        to: Jid,
    },
    /// A per-session or registry-level failure
    Error {
        /// Session the failure is scoped to, when there is one
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
        /// Human-readable failure description
        message: String,
    },
    /// The registry membership changed
    AllSessions {
        /// Snapshot of every registered session
        sessions: Vec<SessionSnapshot>,
    },
}

/// Publish/subscribe hub shared by all sessions
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a bus with the default buffer capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` undelivered events per subscriber
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// A receiver that falls more than the buffer capacity behind observes a
    /// `Lagged` error and skips ahead; publishers are never blocked.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Subscribe and adapt the receiver into a stream
    ///
    /// Lagged gaps are logged and skipped rather than surfaced to the
    /// stream consumer.
    pub fn stream(&self) -> impl Stream<Item = Event> + Send + 'static {
        let mut rx = self.subscribe();
        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("event subscriber lagged, skipped {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    /// Publish an event to all current subscribers
    ///
    /// Publishing with no subscribers is not an error; the event is dropped.
    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            log::trace!("event published with no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_all_see_published_events() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(Event::Error {
            session_id: None,
            message: "boom".to_string(),
        });

        for rx in [&mut a, &mut b] {
            match rx.recv().await.unwrap() {
                Event::Error { message, .. } => assert_eq!(message, "boom"),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(Event::AllSessions { sessions: vec![] });
    }
}
