//! Typed line parsing.
//!
//! A line starting with `/` is a command; anything else is message text.
//! `//` escapes a leading slash.

use parley_app::{DriverInput, UserCommand};
use parley_core::UserId;
use thiserror::Error;

/// Why a line was not understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// `/open` without a numeric user id.
    #[error("usage: /open <user id>")]
    OpenUsage,
    /// `/typing` without `on` or `off`.
    #[error("usage: /typing on|off")]
    TypingUsage,
    /// Not a known command.
    #[error("unknown command /{0}")]
    Unknown(String),
}

/// Parse one line. `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<DriverInput>, InputError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(send(line)));
    };
    if command.starts_with('/') {
        return Ok(Some(send(command)));
    }

    let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    let rest = rest.trim();
    let input = match name {
        "open" => {
            let user_id: UserId = rest.parse().map_err(|_| InputError::OpenUsage)?;
            DriverInput::Command(UserCommand::Select { user_id })
        },
        "users" => DriverInput::Command(UserCommand::Search(rest.to_owned())),
        "typing" => match rest {
            "on" => DriverInput::Command(UserCommand::Typing(true)),
            "off" => DriverInput::Command(UserCommand::Typing(false)),
            _ => return Err(InputError::TypingUsage),
        },
        "quit" | "exit" => DriverInput::Quit,
        other => return Err(InputError::Unknown(other.to_owned())),
    };
    Ok(Some(input))
}

fn send(text: &str) -> DriverInput {
    DriverInput::Command(UserCommand::Send { text: text.to_owned() })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn commands() {
        assert_eq!(
            parse_line("/open 42"),
            Ok(Some(DriverInput::Command(UserCommand::Select { user_id: UserId(42) })))
        );
        assert_eq!(
            parse_line("/users  ana "),
            Ok(Some(DriverInput::Command(UserCommand::Search("ana".into()))))
        );
        assert_eq!(parse_line("/users"), Ok(Some(DriverInput::Command(UserCommand::Search(String::new())))));
        assert_eq!(parse_line("/typing off"), Ok(Some(DriverInput::Command(UserCommand::Typing(false)))));
        assert_eq!(parse_line("/quit\n"), Ok(Some(DriverInput::Quit)));
    }

    #[test]
    fn usage_errors() {
        assert_eq!(parse_line("/open ana"), Err(InputError::OpenUsage));
        assert_eq!(parse_line("/typing"), Err(InputError::TypingUsage));
        assert_eq!(parse_line("/dance"), Err(InputError::Unknown("dance".into())));
    }

    #[test]
    fn text_and_escapes() {
        assert_eq!(parse_line("  "), Ok(None));
        assert_eq!(parse_line("hello there"), Ok(Some(send("hello there"))));
        assert_eq!(parse_line("//open is a command"), Ok(Some(send("/open is a command"))));
    }

    proptest! {
        #[test]
        fn plain_text_is_sent_verbatim(text in "[a-zA-Z0-9][a-zA-Z0-9 .,!?]{0,40}") {
            prop_assert_eq!(parse_line(&text), Ok(Some(send(&text))));
        }
    }
}
