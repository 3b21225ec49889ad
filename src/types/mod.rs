//! Core type definitions
//!
//! Newtype identifiers and session state types shared across the crate.

pub mod identifiers;
pub mod session;

pub use identifiers::{Jid, SessionId};
pub use session::{AuthMethod, SessionSnapshot, SessionStatus, UserProfile};
