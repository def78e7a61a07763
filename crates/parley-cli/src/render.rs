//! Line rendering.
//!
//! Each render prints only what changed since the previous view, so the
//! terminal reads as a transcript.

use std::collections::HashSet;

use parley_app::SessionView;
use parley_client::LinkState;
use parley_core::{Direction, Message, MessageId};

/// Lines describing the change from `previous` to `view`.
pub fn render_lines(previous: Option<&SessionView>, view: &SessionView) -> Vec<String> {
    let mut lines = Vec::new();

    if previous.map(|p| p.link) != Some(view.link) {
        match view.link {
            LinkState::Open => lines.push("-- connected".to_owned()),
            LinkState::Lost => lines.push("-- connection lost".to_owned()),
            LinkState::Unattached => {},
        }
    }

    if previous.is_none() {
        lines.extend(view.conversations.iter().map(|c| {
            let unread = if c.unread_count > 0 { format!(" [{} unread]", c.unread_count) } else { String::new() };
            format!("   {} ({}){unread}", c.username, c.other_user_id)
        }));
    }

    if let Some(status) = &view.status
        && previous.and_then(|p| p.status.as_ref()) != Some(status)
    {
        lines.push(format!("!! {status}"));
    }

    let previous_active = previous.and_then(|p| p.active.as_ref());
    let reloaded = previous.is_some_and(|p| p.loading) && !view.loading;
    if view.active.as_ref() != previous_active || reloaded {
        if let Some(active) = &view.active {
            lines.push(format!("== {} ({}) ==", active.username, active.user_id));
            if view.loading {
                lines.push("   loading...".to_owned());
            }
        }
        lines.extend(view.timeline.iter().map(|m| message_line(view, m)));
    } else if let Some(previous) = previous {
        let shown: HashSet<MessageId> = previous.timeline.iter().map(|m| m.id).collect();
        lines.extend(
            view.timeline
                .iter()
                .filter(|m| !shown.contains(&m.id) && !is_confirmation(m))
                .map(|m| message_line(view, m)),
        );
    }

    if let Some(previous) = previous {
        for conversation in &view.conversations {
            let before = previous.conversations.iter().find(|c| c.other_user_id == conversation.other_user_id);
            let Some(before) = before else { continue };

            if conversation.unread_count > before.unread_count {
                lines.push(format!("*  {}: {} unread", conversation.username, conversation.unread_count));
            }
            let active = view.active.as_ref().is_some_and(|a| a.user_id == conversation.other_user_id);
            if active && conversation.typing && !before.typing {
                lines.push(format!("   {} is typing...", conversation.username));
            }
        }
    }

    if !view.directory_matches.is_empty()
        && previous.map(|p| &p.directory_matches) != Some(&view.directory_matches)
    {
        let names: Vec<_> = view.directory_matches.iter().map(|u| format!("{} ({})", u.username, u.id)).collect();
        lines.push(format!("users: {}", names.join(", ")));
    }

    lines
}

/// An outgoing message that appears under a confirmed id was already shown
/// while pending.
fn is_confirmation(message: &Message) -> bool {
    message.direction == Direction::Outgoing && !message.id.is_pending()
}

fn message_line(view: &SessionView, message: &Message) -> String {
    let author = match message.direction {
        Direction::Outgoing => "me",
        Direction::Incoming => message
            .sender_username
            .as_deref()
            .or_else(|| view.active.as_ref().map(|a| a.username.as_str()))
            .unwrap_or("?"),
    };
    let suffix = if message.id.is_pending() { " (sending)" } else { "" };
    format!("<{author}> {}{suffix}", message.text)
}
