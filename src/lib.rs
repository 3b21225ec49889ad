//! # wamux
//!
//! Multi-session orchestrator for long-lived messaging-network connections.
//! One process operates dozens of logical accounts concurrently, each with
//! its own authentication lifecycle, reconnection behavior, and message
//! dispatch path, behind a single control plane.
//!
//! The wire protocol, encryption, and credential derivation are external:
//! callers plug them in behind the [`Transport`] trait. Credential material
//! is persisted through a [`CredentialStore`]; file-backed and in-memory
//! stores ship with the crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wamux::{AuthMethod, Event, FileCredentialStore, SessionManager, Transport};
//!
//! async fn run(transport: impl Transport) -> Result<(), wamux::WamuxError> {
//!     let store = FileCredentialStore::new("./auth");
//!     let manager = SessionManager::new(transport, store);
//!     let mut events = manager.subscribe();
//!
//!     manager.create_session("shop-1").await?;
//!     manager.start_session("shop-1", AuthMethod::Qr, None).await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             Event::Qr { session_id, payload } => {
//!                 println!("scan this for {session_id}: {payload}");
//!             }
//!             Event::SessionStatus { session_id, status, .. } => {
//!                 println!("{session_id} is now {status:?}");
//!             }
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Once a session reports connected, sends route through it:
//!
//! ```no_run
//! # use wamux::{CredentialStore, SessionManager, Transport};
//! # async fn example<T: Transport, C: CredentialStore>(manager: SessionManager<T, C>)
//! #     -> Result<(), wamux::WamuxError> {
//! manager.send_text("shop-1", "+62 800-011-1222", "order shipped").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`manager`]: session registry, lifecycle state machines, dispatch
//! - [`events`]: typed broadcast fan-out to all subscribers
//! - [`transport`]: the opaque connection capability boundary
//! - [`store`]: credential persistence boundary and shipped stores
//! - [`types`]: identifiers and session state vocabulary
//! - [`error`]: error taxonomy
//!
//! ## Guarantees
//!
//! - At most one connection attempt is in flight per session id; a second
//!   `start` is rejected with a specific error.
//! - A session's failures never propagate to other sessions or the
//!   registry.
//! - Events from one session arrive in generation order.
//! - Deleting a session cancels its pending reconnect and logs the
//!   connection out before the record disappears.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod events;
pub mod manager;
pub mod store;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use error::{Result, WamuxError};
pub use events::{Event, EventBus};
pub use manager::{ReconnectPolicy, SessionManager};
pub use store::{AuthState, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use transport::{
    DisconnectReason, ImageContent, Transport, TransportEvent, TransportHandle,
};
pub use types::identifiers::{Jid, SessionId, JID_DOMAIN};
pub use types::session::{AuthMethod, SessionSnapshot, SessionStatus, UserProfile};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
