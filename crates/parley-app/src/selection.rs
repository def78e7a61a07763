//! Active conversation tracking.
//!
//! ```text
//! NoSelection --select(a)--> Selected(a) --select(b)--> Selected(b)
//!                                 ^   |
//!                                 +---+ select(a): re-runs fetch and mark-read
//! ```

use std::rc::Rc;

use parley_core::{EventBus, UserId, events::DialogChanged};

use crate::SessionAction;

/// The active conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDialog {
    /// Counterpart.
    pub user_id: UserId,
    /// Counterpart display name.
    pub username: String,
}

/// Tracks which conversation is active and announces changes on the bus.
#[derive(Debug)]
pub struct SelectionController {
    bus: Rc<EventBus>,
    active: Option<ActiveDialog>,
}

impl SelectionController {
    /// Create a controller with nothing selected.
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self { bus, active: None }
    }

    /// The active conversation, if any.
    pub fn active(&self) -> Option<&ActiveDialog> {
        self.active.as_ref()
    }

    /// Make `user_id` the active conversation.
    ///
    /// Always re-entrant: selecting the active conversation again re-runs the
    /// history fetch and mark-read. Publishes `dialogChanged` exactly once,
    /// after the selection is updated.
    pub fn select(&mut self, user_id: UserId, username: String) -> [SessionAction; 2] {
        tracing::info!(user_id = %user_id, "conversation selected");

        let event = DialogChanged { user_id, username: username.clone() };
        self.active = Some(ActiveDialog { user_id, username });
        self.bus.publish(&event);

        [SessionAction::FetchHistory { user_id }, SessionAction::MarkAllRead { user_id }]
    }
}
