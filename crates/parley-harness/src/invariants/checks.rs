//! Standard view invariants.

use std::collections::HashSet;

use parley_app::SessionView;

use super::{Invariant, InvariantResult, Violation};

/// The timeline is sorted by send time, non-decreasing.
pub struct TimelineOrdered;

impl Invariant for TimelineOrdered {
    fn name(&self) -> &'static str {
        "timeline_ordered"
    }

    fn check(&self, view: &SessionView) -> InvariantResult {
        match view.timeline.windows(2).find(|w| w[1].sent_at < w[0].sent_at) {
            Some(w) => Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{} (sent {}) follows {} (sent {})",
                    w[1].id, w[1].sent_at, w[0].id, w[0].sent_at
                ),
            }),
            None => Ok(()),
        }
    }
}

/// Every timeline message involves the active counterpart, and there is no
/// timeline without an active conversation.
pub struct TimelineBelongsToActive;

impl Invariant for TimelineBelongsToActive {
    fn name(&self) -> &'static str {
        "timeline_belongs_to_active"
    }

    fn check(&self, view: &SessionView) -> InvariantResult {
        let Some(active) = &view.active else {
            return if view.timeline.is_empty() {
                Ok(())
            } else {
                Err(Violation {
                    invariant: self.name(),
                    message: format!("{} messages without an active conversation", view.timeline.len()),
                })
            };
        };

        match view.timeline.iter().find(|m| !m.involves(active.user_id)) {
            Some(stray) => Err(Violation {
                invariant: self.name(),
                message: format!(
                    "message {} between {} and {} shown in conversation with {}",
                    stray.id, stray.sender_id, stray.recipient_id, active.user_id
                ),
            }),
            None => Ok(()),
        }
    }
}

/// No message id appears twice in the timeline.
pub struct UniqueMessageIds;

impl Invariant for UniqueMessageIds {
    fn name(&self) -> &'static str {
        "unique_message_ids"
    }

    fn check(&self, view: &SessionView) -> InvariantResult {
        let mut seen = HashSet::new();
        match view.timeline.iter().find(|m| !seen.insert(m.id)) {
            Some(dup) => Err(Violation { invariant: self.name(), message: format!("duplicate id {}", dup.id) }),
            None => Ok(()),
        }
    }
}

/// At most one conversation per counterpart.
pub struct ConversationsUnique;

impl Invariant for ConversationsUnique {
    fn name(&self) -> &'static str {
        "conversations_unique"
    }

    fn check(&self, view: &SessionView) -> InvariantResult {
        let mut seen = HashSet::new();
        match view.conversations.iter().find(|c| !seen.insert(c.other_user_id)) {
            Some(dup) => Err(Violation {
                invariant: self.name(),
                message: format!("two conversations with {}", dup.other_user_id),
            }),
            None => Ok(()),
        }
    }
}
