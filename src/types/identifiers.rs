//! Newtype wrappers for type safety
//!
//! Session ids are caller-chosen keys and are validated up front; recipient
//! addresses are normalized into the network's canonical jid form.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WamuxError};

/// Maximum accepted session id length in bytes
const MAX_SESSION_ID_LEN: usize = 64;

/// Domain suffix of canonical recipient addresses
pub const JID_DOMAIN: &str = "s.whatsapp.net";

// ============================================================================
// SESSION ID
// ============================================================================

/// Session ID newtype for type safety
///
/// Ids are validated at the control-surface boundary: non-empty, at most 64
/// bytes, restricted to ASCII alphanumerics plus `.`, `_` and `-`. The id
/// doubles as a credential-store key, so path separators are rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Validate and create a session id
    ///
    /// # Errors
    /// Returns [`WamuxError::Validation`] when the id is empty, too long, or
    /// contains characters outside `[A-Za-z0-9._-]`.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(WamuxError::validation("session id must not be empty"));
        }
        if id.len() > MAX_SESSION_ID_LEN {
            return Err(WamuxError::validation(format!(
                "session id exceeds {MAX_SESSION_ID_LEN} bytes"
            )));
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
        {
            return Err(WamuxError::validation(format!(
                "session id '{id}' contains characters outside [A-Za-z0-9._-]"
            )));
        }
        Ok(Self(id))
    }

    /// Get the session id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// CANONICAL ADDRESS
// ============================================================================

/// Canonical recipient address (jid)
///
/// A digits-only number with the network's fixed domain suffix, e.g.
/// `628000111222@s.whatsapp.net`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jid(String);

impl Jid {
    /// Normalize a recipient into canonical form
    ///
    /// Inputs already containing `@` are treated as canonical and passed
    /// through; anything else is stripped to its digits and suffixed with
    /// [`JID_DOMAIN`].
    ///
    /// # Errors
    /// Returns [`WamuxError::Validation`] when a non-canonical input contains
    /// no digits at all.
    pub fn normalize(recipient: &str) -> Result<Self> {
        if recipient.contains('@') {
            return Ok(Self(recipient.to_string()));
        }
        let digits: String = recipient.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(WamuxError::validation(format!(
                "recipient '{recipient}' contains no digits"
            )));
        }
        Ok(Self(format!("{digits}@{JID_DOMAIN}")))
    }

    /// Wrap an address the transport already reports as canonical
    pub fn from_canonical(jid: impl Into<String>) -> Self {
        Self(jid.into())
    }

    /// Get the jid as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Jid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip a phone number down to its digits for pairing-code requests
#[must_use]
pub(crate) fn digits_only(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}
