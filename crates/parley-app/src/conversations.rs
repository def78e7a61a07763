//! Conversation list state.
//!
//! Holds one [`Conversation`] per counterpart in the order of the initial
//! load. The store never reorders and never creates conversations from
//! messages; events for unknown counterparts are dropped.

use std::collections::HashMap;

use parley_core::{Conversation, Direction, Message, UserId, model::clamp_unread};

/// Conversations of the local user, keyed by counterpart.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    local_user: UserId,
    conversations: Vec<Conversation>,
    index: HashMap<UserId, usize>,
    loaded: bool,
}

impl ConversationStore {
    /// Create an empty store for `local_user`.
    pub fn new(local_user: UserId) -> Self {
        Self { local_user, conversations: Vec::new(), index: HashMap::new(), loaded: false }
    }

    /// Seed the store from the initial load.
    ///
    /// One-time: returns `false` and changes nothing if already loaded.
    /// Duplicate counterparts keep their first occurrence.
    pub fn load(&mut self, initial: Vec<Conversation>) -> bool {
        if self.loaded {
            tracing::warn!("conversation list already loaded, ignoring reload");
            return false;
        }

        for conversation in initial {
            if self.index.contains_key(&conversation.other_user_id) {
                tracing::debug!(user_id = %conversation.other_user_id, "duplicate conversation dropped");
                continue;
            }
            self.index.insert(conversation.other_user_id, self.conversations.len());
            self.conversations.push(conversation);
        }
        self.loaded = true;
        true
    }

    /// Conversations in load order.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Conversation with `user`.
    pub fn get(&self, user: UserId) -> Option<&Conversation> {
        self.index.get(&user).map(|&i| &self.conversations[i])
    }

    fn get_mut(&mut self, user: UserId) -> Option<&mut Conversation> {
        let i = *self.index.get(&user)?;
        self.conversations.get_mut(i)
    }

    /// Set the unread counter for `user`, clamping negatives to zero.
    ///
    /// Returns whether the counter changed.
    pub fn on_unread_count_changed(&mut self, user: UserId, count: i64) -> bool {
        let Some(conversation) = self.get_mut(user) else {
            tracing::debug!(user_id = %user, "unread count for unknown conversation");
            return false;
        };

        let count = clamp_unread(count);
        let changed = conversation.unread_count != count;
        conversation.unread_count = count;
        changed
    }

    /// Update the preview of the conversation `message` belongs to.
    ///
    /// Returns `false` if the counterpart has no conversation.
    pub fn on_message_exchanged(&mut self, message: &Message) -> bool {
        let counterpart = message.counterpart(self.local_user);
        let Some(conversation) = self.get_mut(counterpart) else {
            tracing::debug!(user_id = %counterpart, "message for unknown conversation");
            return false;
        };

        conversation.last_message_preview.clone_from(&message.text);
        if message.direction == Direction::Incoming {
            conversation.typing = false;
        }
        true
    }

    /// A mark-read round trip finished; `count` unread remain.
    pub fn on_messages_read(&mut self, user: UserId, count: u32) -> bool {
        match self.get_mut(user) {
            Some(conversation) => {
                conversation.unread_count = count;
                true
            },
            None => false,
        }
    }

    /// Record a presence change.
    pub fn set_online(&mut self, user: UserId, online: bool) -> bool {
        self.get_mut(user).map(|c| c.online = online).is_some()
    }

    /// Record a typing change.
    pub fn set_typing(&mut self, user: UserId, typing: bool) -> bool {
        self.get_mut(user).map(|c| c.typing = typing).is_some()
    }
}
