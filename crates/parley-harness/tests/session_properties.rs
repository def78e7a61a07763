//! Property tests: the standard view invariants hold after any sequence of
//! selections, sends, frames, history completions and link changes.

use std::time::Duration;

use parley_app::{ChatSession, SessionConfig};
use parley_client::LinkState;
use parley_core::{ChatError, Conversation, Direction, Message, MessageId, UserId};
use parley_harness::{InvariantRegistry, RecordingConnection, SimEnv, frames};
use proptest::prelude::*;

const ME: UserId = UserId(1);
const PEERS: [UserId; 3] = [UserId(5), UserId(6), UserId(7)];

#[derive(Debug, Clone)]
enum Op {
    Select(usize),
    Send(String),
    Incoming { peer: usize, id: Option<i64>, random_id: i64 },
    ConfirmLatest { db_id: i64 },
    ConfirmUnknown { random_id: i64, db_id: i64 },
    History { peer: usize, messages: Vec<(i64, usize, bool, i64)> },
    HistoryFailed(usize),
    Read(i64),
    Unread { peer: usize, count: i64 },
    Drop,
    Reattach,
    Tick(u64),
}

fn op() -> impl Strategy<Value = Op> {
    let peer = 0..PEERS.len();
    let history = prop::option::of(prop::collection::vec(
        (1..50i64, 0..PEERS.len(), any::<bool>(), 0..1_000i64),
        0..6,
    ));
    prop_oneof![
        peer.clone().prop_map(Op::Select),
        "[a-z ]{0,8}".prop_map(Op::Send),
        (peer.clone(), prop::option::of(1..50i64), -50..-1i64)
            .prop_map(|(peer, id, random_id)| Op::Incoming { peer, id, random_id }),
        (1..50i64).prop_map(|db_id| Op::ConfirmLatest { db_id }),
        (-50..-1i64, 1..50i64).prop_map(|(random_id, db_id)| Op::ConfirmUnknown { random_id, db_id }),
        (peer.clone(), history).prop_map(|(peer, messages)| match messages {
            Some(messages) => Op::History { peer, messages },
            None => Op::HistoryFailed(peer),
        }),
        (1..50i64).prop_map(Op::Read),
        (peer, -5..20i64).prop_map(|(peer, count)| Op::Unread { peer, count }),
        any::<bool>().prop_map(|up| if up { Op::Reattach } else { Op::Drop }),
        (0..5_000u64).prop_map(Op::Tick),
    ]
}

fn history_message((id, peer, outgoing, at): (i64, usize, bool, i64)) -> Message {
    let peer = PEERS[peer];
    let (sender_id, recipient_id, direction) =
        if outgoing { (ME, peer, Direction::Outgoing) } else { (peer, ME, Direction::Incoming) };
    Message {
        id: MessageId::Confirmed(id),
        text: format!("h{id}"),
        sent_at: SimEnv::DEFAULT_START - 1_000 + at,
        edited_at: SimEnv::DEFAULT_START - 1_000 + at,
        read: false,
        sender_id,
        recipient_id,
        direction,
        sender_username: None,
    }
}

struct Harness {
    env: SimEnv,
    session: ChatSession<SimEnv>,
    connection: RecordingConnection,
    sent: Vec<i64>,
}

impl Harness {
    fn new(seed: u64) -> Self {
        let env = SimEnv::with_seed(seed);
        let mut session = ChatSession::new(env.clone(), SessionConfig::default(), ME);
        session.load_conversations(PEERS.iter().map(|&p| Conversation::new(p, format!("user{p}"))).collect());
        let connection = RecordingConnection::new();
        session.attach(Box::new(connection.clone())).unwrap();
        Self { env, session, connection, sent: Vec::new() }
    }

    fn apply(&mut self, op: Op) {
        match op {
            Op::Select(peer) => {
                self.session.select(PEERS[peer]).unwrap();
            },
            Op::Send(text) => match self.session.send_message(&text) {
                Ok(id) => self.sent.push(id.value()),
                Err(ChatError::EmptyMessage | ChatError::NoSelection) => {},
                Err(other) => panic!("unexpected send failure: {other}"),
            },
            Op::Incoming { peer, id, random_id } => {
                let raw = match id {
                    Some(id) => frames::text_message(PEERS[peer], ME, "in", random_id, id),
                    None => frames::relayed_text(PEERS[peer], "in", random_id),
                };
                self.session.on_frame(&raw).unwrap();
            },
            Op::ConfirmLatest { db_id } => {
                if let Some(random_id) = self.sent.last() {
                    self.session.on_frame(&frames::id_created(*random_id, db_id)).unwrap();
                }
            },
            Op::ConfirmUnknown { random_id, db_id } => {
                self.session.on_frame(&frames::id_created(random_id, db_id)).unwrap();
            },
            Op::History { peer, messages } => {
                let messages = messages.into_iter().map(history_message).collect();
                self.session.history_loaded(PEERS[peer], Ok(messages));
            },
            Op::HistoryFailed(peer) => {
                self.session.history_loaded(PEERS[peer], Err(ChatError::Fetch("timeout".into())));
            },
            Op::Read(id) => {
                self.session.on_frame(&frames::message_read(id)).unwrap();
            },
            Op::Unread { peer, count } => {
                self.session.on_frame(&frames::unread_count(PEERS[peer], count)).unwrap();
            },
            Op::Drop => self.session.connection_lost(),
            Op::Reattach => {
                if self.session.link_state() == LinkState::Lost {
                    self.connection = RecordingConnection::new();
                    self.session.attach(Box::new(self.connection.clone())).unwrap();
                }
            },
            Op::Tick(millis) => self.env.advance(Duration::from_millis(millis)),
        }
    }
}

proptest! {
    #[test]
    fn view_invariants_hold(seed in any::<u64>(), ops in prop::collection::vec(op(), 1..60)) {
        let registry = InvariantRegistry::standard();
        let mut harness = Harness::new(seed);

        for (step, op) in ops.into_iter().enumerate() {
            let context = format!("step {step}: {op:?}");
            harness.apply(op);
            registry.assert_all(&harness.session.view(), &context);
        }
    }

    #[test]
    fn unread_counts_never_negative_and_total_matches(
        counts in prop::collection::vec((0..PEERS.len(), -10..10i64), 1..30),
    ) {
        let mut harness = Harness::new(0);
        let mut expected = [0u64; 3];

        for (peer, count) in counts {
            harness.apply(Op::Unread { peer, count });
            expected[peer] = u64::try_from(count.max(0)).unwrap();
        }

        prop_assert_eq!(harness.session.view().total_unread(), expected.iter().sum::<u64>());
    }

    #[test]
    fn every_accepted_send_reaches_some_connection(texts in prop::collection::vec("[a-z]{1,6}", 1..10), drop_after in 0usize..10) {
        let mut harness = Harness::new(7);
        harness.apply(Op::Select(0));
        let first = harness.connection.clone();

        for (i, text) in texts.iter().enumerate() {
            if i == drop_after {
                harness.apply(Op::Drop);
            }
            harness.apply(Op::Send(text.clone()));
        }
        harness.apply(Op::Reattach);

        let mut delivered = first.sent_texts();
        if drop_after < texts.len() {
            delivered.extend(harness.connection.sent_texts());
        }
        prop_assert_eq!(delivered, texts);
    }
}
