//! Frame discriminants.

/// Discriminant carried in every frame's `msg_type` field.
///
/// Codes are fixed by the host server and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MsgType {
    /// Counterpart came online (inbound)
    WentOnline = 1,
    /// Counterpart went offline (inbound)
    WentOffline = 2,
    /// Chat text (both directions)
    TextMessage = 3,
    /// File attachment (reserved)
    FileMessage = 4,
    /// Typing started (both directions)
    IsTyping = 5,
    /// Read receipt (both directions)
    MessageRead = 6,
    /// Server-side error report (inbound)
    ErrorOccurred = 7,
    /// Server assigned a database id to a locally sent message (inbound)
    MessageIdCreated = 8,
    /// Unread counter for a conversation changed (inbound)
    NewUnreadCount = 9,
    /// Typing stopped (both directions)
    TypingStopped = 10,
}

impl MsgType {
    /// Every known discriminant, in code order.
    pub const ALL: [Self; 10] = [
        Self::WentOnline,
        Self::WentOffline,
        Self::TextMessage,
        Self::FileMessage,
        Self::IsTyping,
        Self::MessageRead,
        Self::ErrorOccurred,
        Self::MessageIdCreated,
        Self::NewUnreadCount,
        Self::TypingStopped,
    ];

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a discriminant by wire code. `None` for unknown codes.
    #[must_use]
    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| u64::from(t.code()) == code)
    }
}
