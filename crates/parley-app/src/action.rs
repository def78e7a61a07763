//! Side effects requested by the session.

use parley_core::UserId;

/// Asynchronous work the session needs a runtime to perform.
///
/// The session never performs I/O itself. The runtime executes each action
/// and feeds the result back through the matching completion method on
/// [`ChatSession`](crate::ChatSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Fetch message history with `user_id`; complete with
    /// `ChatSession::history_loaded`.
    FetchHistory {
        /// Counterpart
        user_id: UserId,
    },

    /// Mark every message from `user_id` as read; complete with
    /// `ChatSession::mark_read_completed`.
    MarkAllRead {
        /// Counterpart
        user_id: UserId,
    },
}
