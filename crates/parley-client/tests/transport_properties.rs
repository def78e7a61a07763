//! Property tests for the transport outbox.

use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use parley_client::{Connection, ConnectionClosed, LinkState, Transport, TransportConfig};
use parley_core::{Environment, UserId};
use parley_proto::ServerFrame;
use proptest::prelude::*;

#[derive(Clone)]
struct SeqEnv(Rc<RefCell<u64>>);

impl Environment for SeqEnv {
    fn now(&self) -> i64 {
        0
    }

    async fn sleep(&self, _duration: Duration) {}

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut next = self.0.borrow_mut();
        *next = next.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        for (dst, src) in buffer.iter_mut().zip(next.to_be_bytes().iter().cycle()) {
            *dst = *src;
        }
    }
}

/// One connection generation. All generations share the same frame log.
#[derive(Clone)]
struct Wire {
    log: Rc<RefCell<Vec<String>>>,
    open: Rc<RefCell<bool>>,
}

impl Connection for Wire {
    fn send(&mut self, frame: String) -> Result<(), ConnectionClosed> {
        if !*self.open.borrow() {
            return Err(ConnectionClosed { frame });
        }
        self.log.borrow_mut().push(frame);
        Ok(())
    }
}

fn random_ids(log: &[String]) -> Vec<i64> {
    log.iter()
        .filter_map(|raw| match ServerFrame::decode(&raw.replacen("\"user_pk\"", "\"sender\"", 1)) {
            Ok(ServerFrame::TextMessage(text)) => Some(text.random_id),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Op {
    Send,
    Drop,
    Reattach,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![5 => Just(Op::Send), 1 => Just(Op::Drop), 1 => Just(Op::Reattach)]
}

proptest! {
    /// Text frames reach the wire in send order. Only frames evicted from a
    /// full outbox, or still queued, are missing.
    #[test]
    fn prop_outbox_preserves_order(ops in prop::collection::vec(op(), 1..80), capacity in 1usize..8) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut open = Rc::new(RefCell::new(true));
        let mut transport = Transport::new(
            SeqEnv(Rc::new(RefCell::new(7))),
            TransportConfig { outbox_capacity: capacity },
        );
        transport.attach(Box::new(Wire { log: Rc::clone(&log), open: Rc::clone(&open) })).unwrap();

        let mut expected: Vec<i64> = Vec::new();
        let mut queued: VecDeque<i64> = VecDeque::new();

        for op in ops {
            match op {
                Op::Send => {
                    let id = transport.send_message(UserId(2), "x").unwrap();
                    prop_assert!(id < 0);
                    if transport.state() == LinkState::Open {
                        expected.push(id);
                    } else {
                        if queued.len() == capacity {
                            queued.pop_front();
                        }
                        queued.push_back(id);
                    }
                },
                Op::Drop => *open.borrow_mut() = false,
                Op::Reattach => {
                    if transport.state() == LinkState::Lost {
                        open = Rc::new(RefCell::new(true));
                        let flushed = transport
                            .attach(Box::new(Wire { log: Rc::clone(&log), open: Rc::clone(&open) }))
                            .unwrap();
                        prop_assert_eq!(flushed, queued.len());
                        expected.extend(queued.drain(..));
                    }
                },
            }
            prop_assert_eq!(transport.outbox_len(), queued.len());
        }

        prop_assert_eq!(random_ids(&log.borrow()), expected);
    }
}
