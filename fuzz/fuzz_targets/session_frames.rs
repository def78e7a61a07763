//! Fuzz target for a session fed arbitrary frames and commands
//!
//! Interleaves raw frames (arbitrary and well-formed) with selections, sends
//! and history completions. The standard view invariants must hold after
//! every step.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parley_app::{ChatSession, SessionConfig};
use parley_core::{Conversation, UserId};
use parley_harness::{InvariantRegistry, RecordingConnection, SimEnv, frames};

const ME: UserId = UserId(1);

#[derive(Debug, Arbitrary)]
enum Step {
    Raw(String),
    Text { peer: u8, random_id: i64, id: Option<i64> },
    Confirm { random_id: i64, db_id: i64 },
    Select(u8),
    Send(String),
    Unread { peer: u8, count: i64 },
    EmptyHistory(u8),
    Drop,
    Reattach,
}

fn peer(n: u8) -> UserId {
    UserId(2 + u64::from(n % 4))
}

fuzz_target!(|input: (u64, Vec<Step>)| {
    let (seed, steps) = input;
    let registry = InvariantRegistry::standard();
    let mut session = ChatSession::new(SimEnv::with_seed(seed), SessionConfig::default(), ME);
    session.load_conversations((0..4).map(|n| Conversation::new(peer(n), format!("u{n}"))).collect());
    let _ = session.attach(Box::new(RecordingConnection::new()));

    for (i, step) in steps.into_iter().enumerate() {
        match step {
            Step::Raw(raw) => {
                let _ = session.on_frame(&raw);
            },
            Step::Text { peer: n, random_id, id } => {
                let raw = match id {
                    Some(id) => frames::text_message(peer(n), ME, "t", random_id, id),
                    None => frames::relayed_text(peer(n), "t", random_id),
                };
                let _ = session.on_frame(&raw);
            },
            Step::Confirm { random_id, db_id } => {
                let _ = session.on_frame(&frames::id_created(random_id, db_id));
            },
            Step::Select(n) => {
                let _ = session.select(peer(n));
            },
            Step::Send(text) => {
                let _ = session.send_message(&text);
            },
            Step::Unread { peer: n, count } => {
                let _ = session.on_frame(&frames::unread_count(peer(n), count));
            },
            Step::EmptyHistory(n) => {
                session.history_loaded(peer(n), Ok(Vec::new()));
            },
            Step::Drop => session.connection_lost(),
            Step::Reattach => {
                let _ = session.attach(Box::new(RecordingConnection::new()));
            },
        }
        registry.assert_all(&session.view(), &format!("after step {i}"));
    }
});
