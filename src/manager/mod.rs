//! Session orchestration
//!
//! Provides `SessionManager` for registering, starting, monitoring, and
//! controlling many independent messaging-network sessions, each with its
//! own auth handshake, reconnection behavior, and dispatch path.
//!
//! # Module Structure
//!
//! - `registry` - Session record create/get/list/delete
//! - `lifecycle` - Start/logout control calls and their guards
//! - `driver` - Per-session background task reacting to transport events
//! - `dispatch` - Text and image sends through a connected session
//! - `session` - Session record state structures
//! - `commands` - Command protocol for driver communication
//! - `reconnect` - Reconnect backoff policy

mod commands;
mod dispatch;
mod driver;
mod lifecycle;
mod reconnect;
mod registry;
mod session;

pub use reconnect::ReconnectPolicy;

use std::collections::HashMap;
use std::sync::Arc;

use futures::Stream;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::events::{Event, EventBus};
use crate::store::CredentialStore;
use crate::transport::Transport;
use crate::types::identifiers::SessionId;

use session::SessionRecord;

/// Orchestrator for multiple concurrent messaging sessions
///
/// One `SessionManager` owns the registry of session records, drives every
/// session's connection lifecycle, and fans events out to subscribers. All
/// control calls go through it; cloning is cheap and clones share state.
pub struct SessionManager<T: Transport, C: CredentialStore> {
    inner: Arc<ManagerInner<T, C>>,
}

impl<T: Transport, C: CredentialStore> Clone for SessionManager<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Shared state behind the manager and its background tasks
pub(crate) struct ManagerInner<T: Transport, C: CredentialStore> {
    pub(crate) transport: T,
    pub(crate) store: C,
    pub(crate) events: EventBus,
    /// Registry map; structural changes take this lock, per-session state
    /// does not. Never held across an await.
    pub(crate) registry: RwLock<HashMap<SessionId, SessionRecord>>,
    pub(crate) reconnect: ReconnectPolicy,
}

impl<T: Transport, C: CredentialStore> ManagerInner<T, C> {
    pub(crate) fn get(&self, id: &SessionId) -> Option<SessionRecord> {
        self.registry.read().get(id).cloned()
    }

    pub(crate) fn contains(&self, id: &SessionId) -> bool {
        self.registry.read().contains_key(id)
    }

    /// Fetch the record for `id`, creating an uninitialized one if absent
    ///
    /// Returns the record plus whether it was newly inserted. Never
    /// overwrites existing state.
    pub(crate) fn get_or_create(&self, id: &SessionId) -> (SessionRecord, bool) {
        let mut map = self.registry.write();
        if let Some(record) = map.get(id) {
            (record.clone(), false)
        } else {
            let record = SessionRecord::new(id.clone());
            map.insert(id.clone(), record.clone());
            (record, true)
        }
    }
}

impl<T: Transport, C: CredentialStore> SessionManager<T, C> {
    /// Create a manager with the default reconnect policy
    pub fn new(transport: T, store: C) -> Self {
        Self::with_policy(transport, store, ReconnectPolicy::default())
    }

    /// Create a manager with an explicit reconnect policy
    pub fn with_policy(transport: T, store: C, reconnect: ReconnectPolicy) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                transport,
                store,
                events: EventBus::new(),
                registry: RwLock::new(HashMap::new()),
                reconnect,
            }),
        }
    }

    /// The event bus shared by every session
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Subscribe to all future events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    /// Subscribe to all future events as a stream
    pub fn event_stream(&self) -> impl Stream<Item = Event> + Send + 'static {
        self.inner.events.stream()
    }
}
