//! Render snapshot.

use parley_client::LinkState;
use parley_core::{Conversation, DirectoryUser, Message, UserId};

use crate::ActiveDialog;

/// Everything a rendering collaborator needs, detached from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// The local user.
    pub local_user: UserId,
    /// Conversations in load order.
    pub conversations: Vec<Conversation>,
    /// Active conversation.
    pub active: Option<ActiveDialog>,
    /// Timeline of the active conversation.
    pub timeline: Vec<Message>,
    /// Whether the active history is still loading.
    pub loading: bool,
    /// Directory users matching the current search. Empty without a search.
    pub directory_matches: Vec<DirectoryUser>,
    /// Connection state.
    pub link: LinkState,
    /// Last user-visible error or notice.
    pub status: Option<String>,
}

impl SessionView {
    /// Total unread messages across conversations.
    pub fn total_unread(&self) -> u64 {
        self.conversations.iter().map(|c| u64::from(c.unread_count)).sum()
    }
}
