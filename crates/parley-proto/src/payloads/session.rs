//! Session payloads: presence, typing and error reports.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Presence or typing change for one user.
///
/// Shared by `WentOnline`, `WentOffline`, `IsTyping` and `TypingStopped`;
/// the discriminant carries the meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// User whose state changed.
    pub user_pk: UserId,
}

/// Error reported by the server for a frame this client sent.
///
/// On the wire the error is a two-element array `[code, text]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    /// Error code and human-readable description.
    pub error: (u16, String),
}

impl ErrorNotice {
    /// Server error code.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.error.0
    }

    /// Human-readable description.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.error.1
    }
}
