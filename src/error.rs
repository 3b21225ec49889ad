//! Error types for the session orchestration layer

use thiserror::Error;

/// Main error type for wamux operations
#[derive(Error, Debug)]
pub enum WamuxError {
    /// Malformed session id, rejected before any state change
    #[error("Invalid session id: {0}")]
    Validation(String),

    /// `start` called on a session that is already connected
    #[error("Session {0} is already connected")]
    AlreadyConnected(String),

    /// `start` called while a connection attempt is already in flight
    #[error("Session {0} already has a connection in progress")]
    AlreadyInProgress(String),

    /// Send attempted against a session that is missing or not connected
    #[error("Session {0} is not connected")]
    NotConnected(String),

    /// Control call against an id the registry does not know
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Underlying connect/send/logout failure in the transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credential load/save failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A send that reached the transport but failed, with recipient context
    #[error("Send from session {session_id} to {recipient} failed: {message}")]
    SendFailure {
        /// Session the send was issued on
        session_id: String,
        /// Canonical recipient address
        recipient: String,
        /// Underlying failure message
        message: String,
    },

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for wamux operations
pub type Result<T> = std::result::Result<T, WamuxError>;

impl WamuxError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an already-connected error
    pub fn already_connected(session_id: impl Into<String>) -> Self {
        Self::AlreadyConnected(session_id.into())
    }

    /// Create an already-in-progress error
    pub fn already_in_progress(session_id: impl Into<String>) -> Self {
        Self::AlreadyInProgress(session_id.into())
    }

    /// Create a not-connected error
    pub fn not_connected(session_id: impl Into<String>) -> Self {
        Self::NotConnected(session_id.into())
    }

    /// Create a session-not-found error
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound(session_id.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a send failure with recipient context
    pub fn send_failure(
        session_id: impl Into<String>,
        recipient: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SendFailure {
            session_id: session_id.into(),
            recipient: recipient.into(),
            message: message.into(),
        }
    }
}
