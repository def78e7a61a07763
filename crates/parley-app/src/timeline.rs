//! Message timeline of the active conversation.
//!
//! # Invariants
//!
//! - Every message involves the active counterpart.
//! - Messages are non-decreasing in `sent_at`; ties keep insertion order.
//! - No two messages share a [`MessageId`].
//!
//! Optimistic sends enter as `Pending` and are confirmed in place when the
//! server reports the persisted id. History responses for a conversation that
//! is no longer active are discarded.

use std::collections::HashSet;

use parley_core::{Direction, Message, MessageId, UserId};

/// Ordered history of the active conversation.
#[derive(Debug, Clone, Default)]
pub struct TimelineStore {
    active: Option<UserId>,
    messages: Vec<Message>,
    loading: bool,
}

impl TimelineStore {
    /// Create an empty timeline with no active conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Active counterpart.
    pub fn active(&self) -> Option<UserId> {
        self.active
    }

    /// Messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether history for the active conversation is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Switch to `user`: clear the timeline and wait for history.
    pub fn select(&mut self, user: UserId) {
        self.active = Some(user);
        self.messages.clear();
        self.loading = true;
    }

    /// Apply a history response for `user`.
    ///
    /// Returns `false` if `user` is no longer active; the response is stale and
    /// nothing changes. Messages not involving `user` are filtered out.
    /// Messages that arrived while loading are kept unless the history already
    /// has them.
    pub fn load_history(&mut self, user: UserId, history: Vec<Message>) -> bool {
        if self.active != Some(user) {
            tracing::debug!(user_id = %user, "discarding stale history");
            return false;
        }

        let mut merged: Vec<Message> = Vec::with_capacity(history.len() + self.messages.len());
        let mut seen: HashSet<MessageId> = HashSet::with_capacity(history.len());
        for message in history {
            if message.involves(user) && seen.insert(message.id) {
                merged.push(message);
            }
        }

        let arrived = std::mem::take(&mut self.messages);
        merged.extend(arrived.into_iter().filter(|m| !seen.contains(&m.id)));
        merged.sort_by_key(|m| m.sent_at);

        tracing::debug!(user_id = %user, count = merged.len(), "history loaded");
        self.messages = merged;
        self.loading = false;
        true
    }

    /// A history fetch for `user` failed. Stops loading if still active.
    pub fn history_failed(&mut self, user: UserId) -> bool {
        if self.active == Some(user) {
            self.loading = false;
            return true;
        }
        false
    }

    /// Add an optimistic send to the active conversation.
    ///
    /// Ignored unless addressed to the active counterpart.
    pub fn append_outgoing(&mut self, message: Message) -> bool {
        debug_assert_eq!(message.direction, Direction::Outgoing);
        if self.active != Some(message.recipient_id) {
            return false;
        }
        self.insert(message)
    }

    /// Add an incoming message if it comes from the active counterpart.
    ///
    /// Duplicates of an id already shown are ignored.
    pub fn append_incoming(&mut self, message: Message) -> bool {
        if self.active != Some(message.sender_id) {
            return false;
        }
        if self.contains(message.id) {
            tracing::debug!(id = %message.id, "duplicate incoming message");
            return false;
        }
        self.insert(message)
    }

    /// Confirm the placeholder `random_id` as `db_id`.
    ///
    /// Mutates the pending entry in place. If `db_id` is already shown, the
    /// pending entry is a duplicate and is removed. Returns `false` when there
    /// is no such placeholder; this is expected for messages outside the
    /// active conversation.
    pub fn reconcile_id(&mut self, random_id: i64, db_id: i64) -> bool {
        let pending = MessageId::Pending(random_id);
        let confirmed = MessageId::Confirmed(db_id);

        let Some(position) = self.messages.iter().position(|m| m.id == pending) else {
            tracing::debug!(random_id, db_id, "reconcile miss");
            return false;
        };

        if self.contains(confirmed) {
            self.messages.remove(position);
        } else if let Some(message) = self.messages.get_mut(position) {
            message.id = confirmed;
        }
        true
    }

    /// Mark the confirmed message `message_id` as read.
    pub fn mark_read(&mut self, message_id: i64) -> bool {
        let id = MessageId::Confirmed(message_id);
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.read = true;
                true
            },
            None => false,
        }
    }

    fn contains(&self, id: MessageId) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    /// Insert after every message sent at or before `message`. For
    /// chronological arrivals this is an append.
    fn insert(&mut self, message: Message) -> bool {
        let at = self.messages.partition_point(|m| m.sent_at <= message.sent_at);
        self.messages.insert(at, message);
        true
    }
}
