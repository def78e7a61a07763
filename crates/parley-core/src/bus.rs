//! Topic-keyed publish/subscribe.
//!
//! The bus is synchronous and single-threaded: `publish` runs every handler
//! for the topic on the calling stack before returning.
//!
//! # Dispatch semantics
//!
//! `publish` takes a snapshot of the topic's subscribers before calling any
//! of them and runs the snapshot to completion:
//!
//! - a handler unsubscribed during the dispatch still receives the current
//!   payload, but no later ones
//! - a handler subscribed during the dispatch receives only later payloads
//! - a handler returning `Err` is logged and counted; delivery continues with
//!   the next handler
//!
//! Handlers may publish, subscribe and unsubscribe re-entrantly. No borrow of
//! the registry is held while a handler runs.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    rc::Rc,
};

use crate::HandlerError;

/// Named channel on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Active conversation changed.
    DialogChanged,
    /// Local user sent a message.
    OutgoingMessage,
    /// Counterpart sent a message.
    IncomingMessage,
    /// Placeholder id confirmed.
    MessageIdCreated,
    /// Unread counter changed.
    NewUnreadCount,
    /// Conversation marked read.
    MessagesRead,
    /// Presence changed.
    PresenceChanged,
    /// Typing state changed.
    TypingChanged,
    /// Counterpart read one of our messages.
    ReadReceipt,
    /// Server rejected a frame.
    ServerError,
}

impl Topic {
    /// Every topic.
    pub const ALL: [Self; 10] = [
        Self::DialogChanged,
        Self::OutgoingMessage,
        Self::IncomingMessage,
        Self::MessageIdCreated,
        Self::NewUnreadCount,
        Self::MessagesRead,
        Self::PresenceChanged,
        Self::TypingChanged,
        Self::ReadReceipt,
        Self::ServerError,
    ];

    /// Topic name as used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DialogChanged => "dialogChanged",
            Self::OutgoingMessage => "outgoingMessage",
            Self::IncomingMessage => "incomingMessage",
            Self::MessageIdCreated => "messageIdCreated",
            Self::NewUnreadCount => "newUnreadCount",
            Self::MessagesRead => "messagesRead",
            Self::PresenceChanged => "presenceChanged",
            Self::TypingChanged => "typingChanged",
            Self::ReadReceipt => "readReceipt",
            Self::ServerError => "serverError",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload bound to exactly one topic.
pub trait Event: Any + fmt::Debug {
    /// Topic this payload is published on.
    const TOPIC: Topic;
}

type Handler = Rc<dyn Fn(&dyn Any) -> Result<(), HandlerError>>;

struct Entry {
    id: u64,
    handler: Handler,
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    topic: Topic,
    id: u64,
}

impl Subscription {
    /// Topic this subscription listens on.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        self.topic
    }
}

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delivery {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned `Err`.
    pub failed: usize,
}

/// Process-local publish/subscribe registry.
#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<HashMap<Topic, Vec<Entry>>>,
    next_id: Cell<u64>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `T`'s topic, after any existing handlers.
    pub fn subscribe<T, F>(&self, handler: F) -> Subscription
    where
        T: Event,
        F: Fn(&T) -> Result<(), HandlerError> + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let erased: Handler = Rc::new(move |payload: &dyn Any| {
            let payload = payload
                .downcast_ref::<T>()
                .ok_or(HandlerError::PayloadMismatch { topic: T::TOPIC })?;
            handler(payload)
        });

        self.handlers.borrow_mut().entry(T::TOPIC).or_default().push(Entry { id, handler: erased });
        tracing::trace!(topic = %T::TOPIC, id, "subscribed");

        Subscription { topic: T::TOPIC, id }
    }

    /// Remove a handler. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let Some(entries) = handlers.get_mut(&subscription.topic) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != subscription.id);
        let removed = entries.len() != before;

        if removed {
            tracing::trace!(topic = %subscription.topic, id = subscription.id, "unsubscribed");
        }
        removed
    }

    /// Deliver `payload` to every handler subscribed to `T`'s topic, in
    /// subscription order.
    ///
    /// Publishing to a topic with no subscribers is a no-op.
    pub fn publish<T: Event>(&self, payload: &T) -> Delivery {
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .get(&T::TOPIC)
            .map(|entries| entries.iter().map(|entry| Rc::clone(&entry.handler)).collect())
            .unwrap_or_default();

        tracing::trace!(topic = %T::TOPIC, handlers = snapshot.len(), "publish");

        let mut delivery = Delivery::default();
        for handler in snapshot {
            match handler(payload) {
                Ok(()) => delivery.delivered += 1,
                Err(error) => {
                    delivery.failed += 1;
                    tracing::warn!(topic = %T::TOPIC, %error, "handler failed");
                },
            }
        }
        delivery
    }

    /// Number of handlers currently subscribed to `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers.borrow().get(&topic).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.borrow();
        let mut map = f.debug_map();
        for topic in Topic::ALL {
            if let Some(entries) = handlers.get(&topic) {
                map.entry(&topic.as_str(), &entries.len());
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Ping(u32);

    impl Event for Ping {
        const TOPIC: Topic = Topic::NewUnreadCount;
    }

    #[derive(Debug)]
    struct Pong;

    impl Event for Pong {
        const TOPIC: Topic = Topic::MessagesRead;
    }

    fn recorder() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(&Ping(1)), Delivery::default());
    }

    #[test]
    fn delivers_in_subscription_order() {
        let bus = EventBus::new();
        let log = recorder();

        for name in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            bus.subscribe(move |ping: &Ping| {
                log.borrow_mut().push(format!("{name}{}", ping.0));
                Ok(())
            });
        }

        let delivery = bus.publish(&Ping(7));

        assert_eq!(*log.borrow(), ["a7", "b7", "c7"]);
        assert_eq!(delivery, Delivery { delivered: 3, failed: 0 });
    }

    #[test]
    fn failing_handler_does_not_stop_delivery() {
        let bus = EventBus::new();
        let log = recorder();

        bus.subscribe(|_: &Ping| Err(HandlerError::Rejected("boom".into())));
        let sink = Rc::clone(&log);
        bus.subscribe(move |_: &Ping| {
            sink.borrow_mut().push("after".into());
            Ok(())
        });

        let delivery = bus.publish(&Ping(1));

        assert_eq!(*log.borrow(), ["after"]);
        assert_eq!(delivery, Delivery { delivered: 1, failed: 1 });
    }

    #[test]
    fn topics_are_isolated() {
        let bus = EventBus::new();
        let log = recorder();
        let sink = Rc::clone(&log);
        bus.subscribe(move |_: &Pong| {
            sink.borrow_mut().push("pong".into());
            Ok(())
        });

        bus.publish(&Ping(1));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn unsubscribe_mid_dispatch_runs_snapshot_to_completion() {
        let bus = Rc::new(EventBus::new());
        let log = recorder();
        let victim: Rc<Cell<Option<Subscription>>> = Rc::new(Cell::new(None));

        {
            let (bus_ref, log, victim) = (Rc::clone(&bus), Rc::clone(&log), Rc::clone(&victim));
            bus.subscribe(move |_: &Ping| {
                log.borrow_mut().push("first".into());
                if let Some(sub) = victim.take() {
                    assert!(bus_ref.unsubscribe(sub));
                }
                Ok(())
            });
        }
        {
            let log = Rc::clone(&log);
            victim.set(Some(bus.subscribe(move |_: &Ping| {
                log.borrow_mut().push("second".into());
                Ok(())
            })));
        }
        {
            let log = Rc::clone(&log);
            bus.subscribe(move |_: &Ping| {
                log.borrow_mut().push("third".into());
                Ok(())
            });
        }

        bus.publish(&Ping(1));
        assert_eq!(*log.borrow(), ["first", "second", "third"]);

        log.borrow_mut().clear();
        bus.publish(&Ping(2));
        assert_eq!(*log.borrow(), ["first", "third"]);
    }

    #[test]
    fn subscribe_mid_dispatch_applies_to_later_publishes() {
        let bus = Rc::new(EventBus::new());
        let log = recorder();

        {
            let (bus_ref, log) = (Rc::clone(&bus), Rc::clone(&log));
            let added = Cell::new(false);
            bus.subscribe(move |_: &Ping| {
                if !added.replace(true) {
                    let log = Rc::clone(&log);
                    bus_ref.subscribe(move |ping: &Ping| {
                        log.borrow_mut().push(format!("late{}", ping.0));
                        Ok(())
                    });
                }
                Ok(())
            });
        }

        bus.publish(&Ping(1));
        assert!(log.borrow().is_empty());

        bus.publish(&Ping(2));
        assert_eq!(*log.borrow(), ["late2"]);
    }

    #[test]
    fn reentrant_publish_is_delivered_inline() {
        let bus = Rc::new(EventBus::new());
        let log = recorder();

        {
            let (bus_ref, log) = (Rc::clone(&bus), Rc::clone(&log));
            bus.subscribe(move |ping: &Ping| {
                log.borrow_mut().push(format!("ping{}", ping.0));
                bus_ref.publish(&Pong);
                log.borrow_mut().push("ping-done".into());
                Ok(())
            });
        }
        {
            let log = Rc::clone(&log);
            bus.subscribe(move |_: &Pong| {
                log.borrow_mut().push("pong".into());
                Ok(())
            });
        }

        bus.publish(&Ping(3));
        assert_eq!(*log.borrow(), ["ping3", "pong", "ping-done"]);
    }

    #[test]
    fn double_unsubscribe_reports_false() {
        let bus = EventBus::new();
        let sub = bus.subscribe(|_: &Ping| Ok(()));

        assert_eq!(sub.topic(), Topic::NewUnreadCount);
        assert!(bus.unsubscribe(sub));
        assert!(!bus.unsubscribe(sub));
        assert_eq!(bus.subscriber_count(Topic::NewUnreadCount), 0);
    }
}
