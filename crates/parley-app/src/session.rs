//! Chat session: owns the bus, transport and stores and wires them together.
//!
//! Stores are mutated only by their bus subscriptions. The session's own
//! methods translate user intents and I/O completions into publications and
//! return [`SessionAction`]s for the runtime; they never perform I/O.
//!
//! # Subscriptions
//!
//! | topic              | subscriber                                    |
//! |--------------------|-----------------------------------------------|
//! | `dialogChanged`    | timeline (select)                             |
//! | `outgoingMessage`  | conversations (preview), timeline (append)    |
//! | `incomingMessage`  | conversations (preview), timeline (append), read receipts |
//! | `messageIdCreated` | timeline (reconcile)                          |
//! | `newUnreadCount`   | conversations (counter)                       |
//! | `messagesRead`     | conversations (counter)                       |
//! | `presenceChanged`  | conversations (online)                        |
//! | `typingChanged`    | conversations (typing)                        |
//! | `readReceipt`      | timeline (read flag)                          |
//! | `serverError`      | status line                                   |

use std::{cell::RefCell, rc::Rc};

use parley_client::{Connection, Dispatcher, LinkState, Transport};
use parley_core::{
    ChatError, Conversation, Direction, DirectoryUser, Environment, Event, EventBus, HandlerError,
    Message, MessageId, Subscription, Topic, UserId,
    events::{
        DialogChanged, IncomingMessage, MessageIdCreated, MessagesRead, NewUnreadCount,
        OutgoingMessage, PresenceChanged, ReadReceipt, ServerError, TypingChanged,
    },
};

use crate::{
    ConversationStore, SelectionController, SessionAction, SessionConfig, SessionView,
    TimelineStore, UserDirectory,
};

/// One user's chat session.
pub struct ChatSession<E: Environment> {
    env: E,
    local_user: UserId,
    bus: Rc<EventBus>,
    transport: Rc<RefCell<Transport<E>>>,
    dispatcher: Dispatcher<E>,
    conversations: Rc<RefCell<ConversationStore>>,
    timeline: Rc<RefCell<TimelineStore>>,
    selection: SelectionController,
    directory: UserDirectory,
    search: Option<String>,
    status: Rc<RefCell<Option<String>>>,
    subscriptions: Vec<Subscription>,
}

impl<E: Environment> ChatSession<E> {
    /// Create a session for `local_user` with all stores subscribed.
    pub fn new(env: E, config: SessionConfig, local_user: UserId) -> Self {
        let bus = Rc::new(EventBus::new());
        let transport = Rc::new(RefCell::new(Transport::new(env.clone(), config.transport)));
        let conversations = Rc::new(RefCell::new(ConversationStore::new(local_user)));
        let timeline = Rc::new(RefCell::new(TimelineStore::new()));
        let status = Rc::new(RefCell::new(None));

        let mut subscriptions = vec![
            on(&bus, &timeline, "timeline", |t, e: &DialogChanged| t.select(e.user_id)),
            on(&bus, &conversations, "conversations", |c, e: &OutgoingMessage| {
                c.on_message_exchanged(&e.0);
            }),
            on(&bus, &timeline, "timeline", |t, e: &OutgoingMessage| {
                t.append_outgoing(e.0.clone());
            }),
            on(&bus, &conversations, "conversations", |c, e: &IncomingMessage| {
                c.on_message_exchanged(&e.0);
            }),
            on(&bus, &timeline, "timeline", |t, e: &IncomingMessage| {
                t.append_incoming(e.0.clone());
            }),
            on(&bus, &timeline, "timeline", |t, e: &MessageIdCreated| {
                t.reconcile_id(e.random_id, e.db_id);
            }),
            on(&bus, &conversations, "conversations", |c, e: &NewUnreadCount| {
                c.on_unread_count_changed(e.user_id, e.count);
            }),
            on(&bus, &conversations, "conversations", |c, e: &MessagesRead| {
                c.on_messages_read(e.user_id, e.count);
            }),
            on(&bus, &conversations, "conversations", |c, e: &PresenceChanged| {
                c.set_online(e.user_id, e.online);
            }),
            on(&bus, &conversations, "conversations", |c, e: &TypingChanged| {
                c.set_typing(e.user_id, e.typing);
            }),
            on(&bus, &timeline, "timeline", |t, e: &ReadReceipt| {
                t.mark_read(e.message_id);
            }),
            on(&bus, &status, "status", |s, e: &ServerError| {
                *s = Some(format!("server error {}: {}", e.code, e.message));
            }),
        ];

        if config.auto_read_receipts {
            subscriptions.push(subscribe_read_receipts(&bus, &transport, &timeline));
        }

        let dispatcher = Dispatcher::new(env.clone(), Rc::clone(&bus), local_user);
        let selection = SelectionController::new(Rc::clone(&bus));

        Self {
            env,
            local_user,
            bus,
            transport,
            dispatcher,
            conversations,
            timeline,
            selection,
            directory: UserDirectory::new(),
            search: None,
            status,
            subscriptions,
        }
    }

    /// The local user.
    pub fn local_user(&self) -> UserId {
        self.local_user
    }

    /// The session's bus, for additional subscribers.
    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    /// Connection state.
    pub fn link_state(&self) -> LinkState {
        self.transport.borrow().state()
    }

    /// Install a connection and flush frames queued while it was down.
    ///
    /// Re-attaching clears the connection-lost notice, unless the new
    /// connection closed during the flush.
    pub fn attach(&mut self, connection: Box<dyn Connection>) -> Result<usize, ChatError> {
        let reattached = self.link_state() == LinkState::Lost;
        let flushed = self.transport.borrow_mut().attach(connection)?;
        if reattached && self.link_state() == LinkState::Open {
            self.status.borrow_mut().take();
        }
        Ok(flushed)
    }

    /// The connection dropped.
    pub fn connection_lost(&mut self) {
        self.transport.borrow_mut().connection_lost();
        *self.status.borrow_mut() = Some("connection lost, reconnecting".to_owned());
    }

    /// Handle one raw inbound frame.
    ///
    /// Undecodable frames are dropped; the error is returned for the caller to
    /// log and the connection stays usable.
    pub fn on_frame(&mut self, raw: &str) -> Result<Option<Topic>, ChatError> {
        self.dispatcher.on_frame(raw).map_err(ChatError::from)
    }

    /// Seed the conversation list.
    pub fn load_conversations(&mut self, conversations: Vec<Conversation>) {
        let count = conversations.len();
        if self.conversations.borrow_mut().load(conversations) {
            tracing::info!(count, "conversations loaded");
        }
    }

    /// Seed the user directory.
    pub fn load_directory(&mut self, users: Vec<DirectoryUser>) {
        tracing::info!(count = users.len(), "directory loaded");
        self.directory.load(users);
    }

    /// Surface an error. Only user-visible errors reach the status line.
    pub fn report_failure(&mut self, error: &ChatError) {
        tracing::warn!(%error, "operation failed");
        if error.is_user_visible() {
            *self.status.borrow_mut() = Some(error.to_string());
        }
    }

    /// Last user-visible error or notice.
    pub fn status(&self) -> Option<String> {
        self.status.borrow().clone()
    }

    /// Select the conversation with `user_id`.
    ///
    /// The username comes from the conversation list, or from the directory
    /// for users without a conversation yet.
    ///
    /// # Errors
    ///
    /// - `ChatError::UnknownUser` if `user_id` is in neither
    pub fn select(&mut self, user_id: UserId) -> Result<[SessionAction; 2], ChatError> {
        let username = self
            .conversations
            .borrow()
            .get(user_id)
            .map(|c| c.username.clone())
            .or_else(|| self.directory.get(user_id).map(|u| u.username.clone()))
            .ok_or(ChatError::UnknownUser(user_id))?;

        self.search = None;
        self.status.borrow_mut().take();
        Ok(self.selection.select(user_id, username))
    }

    /// Send `text` to the active conversation.
    ///
    /// The message is shown immediately with a pending id and exactly one
    /// `outgoingMessage` is published.
    ///
    /// # Errors
    ///
    /// - `ChatError::EmptyMessage` if `text` is blank; nothing is written
    /// - `ChatError::NoSelection` without an active conversation
    /// - `ChatError::NotConnected` before the first connection
    pub fn send_message(&mut self, text: &str) -> Result<MessageId, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let counterpart = self.selection.active().map(|a| a.user_id).ok_or(ChatError::NoSelection)?;

        let random_id = self.transport.borrow_mut().send_message(counterpart, text)?;

        let now = self.env.now();
        let id = MessageId::Pending(random_id);
        self.bus.publish(&OutgoingMessage(Message {
            id,
            text: text.to_owned(),
            sent_at: now,
            edited_at: now,
            read: false,
            sender_id: self.local_user,
            recipient_id: counterpart,
            direction: Direction::Outgoing,
            sender_username: None,
        }));
        Ok(id)
    }

    /// Tell the active counterpart we started or stopped typing.
    pub fn notify_typing(&mut self, typing: bool) -> Result<(), ChatError> {
        let counterpart = self.selection.active().map(|a| a.user_id).ok_or(ChatError::NoSelection)?;
        self.transport.borrow_mut().send_typing(counterpart, typing)
    }

    /// Complete a [`SessionAction::FetchHistory`].
    ///
    /// Returns whether the timeline changed. Responses for a conversation that
    /// is no longer active are discarded, successful or not.
    pub fn history_loaded(&mut self, user_id: UserId, result: Result<Vec<Message>, ChatError>) -> bool {
        match result {
            Ok(history) => self.timeline.borrow_mut().load_history(user_id, history),
            Err(error) => {
                let current = self.timeline.borrow_mut().history_failed(user_id);
                if current {
                    self.report_failure(&error);
                } else {
                    tracing::debug!(user_id = %user_id, %error, "stale history fetch failed");
                }
                current
            },
        }
    }

    /// Complete a [`SessionAction::MarkAllRead`]. Publishes `messagesRead`
    /// with a zero count on success.
    pub fn mark_read_completed(&mut self, user_id: UserId, result: Result<(), ChatError>) {
        match result {
            Ok(()) => {
                self.bus.publish(&MessagesRead { user_id, count: 0 });
            },
            Err(error) => self.report_failure(&error),
        }
    }

    /// Filter the directory by `query`. An empty query clears the search.
    pub fn search_users(&mut self, query: &str) {
        self.search = (!query.trim().is_empty()).then(|| query.to_owned());
    }

    /// Snapshot of the session for rendering.
    pub fn view(&self) -> SessionView {
        let timeline = self.timeline.borrow();
        SessionView {
            local_user: self.local_user,
            conversations: self.conversations.borrow().conversations().to_vec(),
            active: self.selection.active().cloned(),
            timeline: timeline.messages().to_vec(),
            loading: timeline.is_loading(),
            directory_matches: self
                .search
                .as_deref()
                .map(|q| self.directory.search(q).into_iter().cloned().collect())
                .unwrap_or_default(),
            link: self.link_state(),
            status: self.status(),
        }
    }
}

impl<E: Environment> Drop for ChatSession<E> {
    fn drop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.bus.unsubscribe(subscription);
        }
    }
}

impl<E: Environment> std::fmt::Debug for ChatSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("local_user", &self.local_user)
            .field("active", &self.selection.active())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

/// Subscribe `apply` to mutate `store` for every `T`.
///
/// A store already borrowed further up the stack reports `Busy` instead of
/// panicking.
fn on<T, S>(
    bus: &EventBus,
    store: &Rc<RefCell<S>>,
    name: &'static str,
    apply: impl Fn(&mut S, &T) + 'static,
) -> Subscription
where
    T: Event,
    S: 'static,
{
    let store = Rc::clone(store);
    bus.subscribe(move |event: &T| {
        let mut store = store.try_borrow_mut().map_err(|_| HandlerError::Busy { store: name })?;
        apply(&mut store, event);
        Ok(())
    })
}

/// Acknowledge incoming messages shown in the active conversation.
///
/// Only messages with a positive server id can be acknowledged.
fn subscribe_read_receipts<E: Environment>(
    bus: &EventBus,
    transport: &Rc<RefCell<Transport<E>>>,
    timeline: &Rc<RefCell<TimelineStore>>,
) -> Subscription {
    let transport = Rc::clone(transport);
    let timeline = Rc::clone(timeline);
    bus.subscribe(move |event: &IncomingMessage| {
        let message = &event.0;
        let active = timeline.try_borrow().map_err(|_| HandlerError::Busy { store: "timeline" })?.active();
        if active != Some(message.sender_id) {
            return Ok(());
        }
        let Some(server_id) = message.id.server_id() else {
            return Ok(());
        };

        let mut transport =
            transport.try_borrow_mut().map_err(|_| HandlerError::Busy { store: "transport" })?;
        transport
            .send_read_receipt(message.sender_id, server_id)
            .map_err(|e| HandlerError::Rejected(e.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parley_client::ConnectionClosed;

    use super::*;

    #[derive(Clone)]
    struct TestEnv(Rc<RefCell<u64>>);

    impl Environment for TestEnv {
        fn now(&self) -> i64 {
            1_000
        }

        async fn sleep(&self, _duration: Duration) {}

        fn random_bytes(&self, buffer: &mut [u8]) {
            let mut counter = self.0.borrow_mut();
            *counter += 1;
            for (dst, src) in buffer.iter_mut().zip(counter.to_be_bytes().iter().cycle()) {
                *dst = *src;
            }
        }
    }

    #[derive(Clone, Default)]
    struct Wire(Rc<RefCell<Vec<String>>>);

    impl Connection for Wire {
        fn send(&mut self, frame: String) -> Result<(), ConnectionClosed> {
            self.0.borrow_mut().push(frame);
            Ok(())
        }
    }

    struct Closed;

    impl Connection for Closed {
        fn send(&mut self, frame: String) -> Result<(), ConnectionClosed> {
            Err(ConnectionClosed { frame })
        }
    }

    const ME: UserId = UserId(1);

    fn session() -> (ChatSession<TestEnv>, Wire) {
        let mut session = ChatSession::new(TestEnv(Rc::new(RefCell::new(0))), SessionConfig::default(), ME);
        let wire = Wire::default();
        session.attach(Box::new(wire.clone())).unwrap();
        session.load_conversations(vec![
            Conversation::new(UserId(7), "gus"),
            Conversation { unread_count: 2, ..Conversation::new(UserId(5), "ana") },
        ]);
        (session, wire)
    }

    fn count_outgoing(session: &ChatSession<TestEnv>) -> Rc<RefCell<usize>> {
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        session.bus().subscribe(move |_: &OutgoingMessage| {
            *sink.borrow_mut() += 1;
            Ok(())
        });
        count
    }

    #[test]
    fn send_shows_pending_message_immediately() {
        let (mut session, wire) = session();
        session.select(UserId(7)).unwrap();
        let published = count_outgoing(&session);

        let id = session.send_message("hi").unwrap();

        let MessageId::Pending(local) = id else { panic!("expected pending id") };
        assert!(local < 0);
        assert_eq!(*published.borrow(), 1);

        let view = session.view();
        assert_eq!(view.timeline.len(), 1);
        assert_eq!(view.timeline[0].id, id);
        assert_eq!(view.timeline[0].direction, Direction::Outgoing);
        assert_eq!(view.conversations[0].last_message_preview, "hi");
        assert!(wire.0.borrow()[0].contains(&format!("\"random_id\":{local}")));
    }

    #[test]
    fn blank_text_is_rejected_before_any_write() {
        let (mut session, wire) = session();
        session.select(UserId(7)).unwrap();

        assert_eq!(session.send_message("   "), Err(ChatError::EmptyMessage));
        assert!(wire.0.borrow().is_empty());
    }

    #[test]
    fn send_without_selection_fails() {
        let (mut session, _wire) = session();
        assert_eq!(session.send_message("hi"), Err(ChatError::NoSelection));
    }

    #[test]
    fn send_before_connect_fails_without_publishing() {
        let mut session = ChatSession::new(TestEnv(Rc::new(RefCell::new(0))), SessionConfig::default(), ME);
        session.load_conversations(vec![Conversation::new(UserId(7), "gus")]);
        session.select(UserId(7)).unwrap();
        let published = count_outgoing(&session);

        assert_eq!(session.send_message("hi"), Err(ChatError::NotConnected));
        assert_eq!(*published.borrow(), 0);
        assert!(session.view().timeline.is_empty());
    }

    #[test]
    fn id_confirmation_reconciles_in_place() {
        let (mut session, _wire) = session();
        session.select(UserId(7)).unwrap();
        session.history_loaded(UserId(7), Ok(Vec::new()));
        let MessageId::Pending(local) = session.send_message("hi").unwrap() else { panic!() };

        session.on_frame(&format!(r#"{{"msg_type":8,"random_id":{local},"db_id":300}}"#)).unwrap();

        assert_eq!(session.view().timeline[0].id, MessageId::Confirmed(300));
    }

    #[test]
    fn stale_history_is_discarded() {
        let (mut session, _wire) = session();
        session.select(UserId(5)).unwrap();
        session.select(UserId(7)).unwrap();

        let stale = Message {
            id: MessageId::Confirmed(1),
            text: "old".into(),
            sent_at: 1,
            edited_at: 1,
            read: true,
            sender_id: UserId(5),
            recipient_id: ME,
            direction: Direction::Incoming,
            sender_username: None,
        };
        assert!(!session.history_loaded(UserId(5), Ok(vec![stale])));

        let view = session.view();
        assert!(view.timeline.is_empty());
        assert!(view.loading);
        assert_eq!(view.active.map(|a| a.user_id), Some(UserId(7)));
    }

    #[test]
    fn mark_read_zeroes_unread() {
        let (mut session, _wire) = session();
        session.select(UserId(5)).unwrap();
        session.mark_read_completed(UserId(5), Ok(()));

        assert_eq!(session.view().conversations[1].unread_count, 0);
    }

    #[test]
    fn incoming_in_active_conversation_is_acknowledged() {
        let (mut session, wire) = session();
        session.select(UserId(5)).unwrap();

        session.on_frame(r#"{"msg_type":3,"sender":"5","receiver":"1","text":"yo","random_id":-3,"id":88}"#).unwrap();
        session.on_frame(r#"{"msg_type":3,"sender":"5","receiver":"1","text":"no id","random_id":-4}"#).unwrap();

        let frames = wire.0.borrow();
        let receipts: Vec<&String> = frames.iter().filter(|f| f.contains("\"msg_type\":6")).collect();
        assert_eq!(receipts.len(), 1);
        assert!(receipts[0].contains("\"message_id\":88"));
        assert_eq!(session.view().timeline.len(), 2);
    }

    #[test]
    fn incoming_in_inactive_conversation_updates_preview_only() {
        let (mut session, wire) = session();
        session.select(UserId(7)).unwrap();

        session.on_frame(r#"{"msg_type":3,"sender":"5","text":"psst","random_id":-3,"id":9}"#).unwrap();

        let view = session.view();
        assert!(view.timeline.is_empty());
        assert_eq!(view.conversations[1].last_message_preview, "psst");
        assert!(wire.0.borrow().is_empty());
    }

    #[test]
    fn unknown_user_cannot_be_selected() {
        let (mut session, _wire) = session();
        assert_eq!(session.select(UserId(99)), Err(ChatError::UnknownUser(UserId(99))));

        session.load_directory(vec![DirectoryUser { id: UserId(99), username: "zoe".into() }]);
        session.select(UserId(99)).unwrap();
        assert_eq!(session.view().active.map(|a| a.username), Some("zoe".to_owned()));
    }

    #[test]
    fn server_error_reaches_status_line() {
        let (mut session, _wire) = session();
        session.on_frame(r#"{"msg_type":7,"error":[4,"message too long"]}"#).unwrap();
        assert_eq!(session.status().as_deref(), Some("server error 4: message too long"));
    }

    #[test]
    fn malformed_frame_is_reported_and_state_survives() {
        let (mut session, _wire) = session();
        session.select(UserId(7)).unwrap();
        session.send_message("kept").unwrap();

        assert!(matches!(session.on_frame("{"), Err(ChatError::Decode(_))));
        assert_eq!(session.view().timeline.len(), 1);
    }

    #[test]
    fn reattach_clears_lost_notice() {
        let (mut session, _wire) = session();
        session.connection_lost();
        assert!(session.status().is_some());

        session.attach(Box::new(Wire::default())).unwrap();
        assert_eq!(session.link_state(), LinkState::Open);
        assert_eq!(session.status(), None);
    }

    #[test]
    fn reattach_closing_during_flush_keeps_lost_notice() {
        let (mut session, _wire) = session();
        session.select(UserId(7)).unwrap();
        session.connection_lost();
        session.send_message("queued").unwrap();

        session.attach(Box::new(Closed)).unwrap();
        assert_eq!(session.link_state(), LinkState::Lost);
        assert_eq!(session.status().as_deref(), Some("connection lost, reconnecting"));

        let wire = Wire::default();
        session.attach(Box::new(wire.clone())).unwrap();
        assert_eq!(wire.0.borrow().len(), 1);
        assert_eq!(session.status(), None);
    }
}
