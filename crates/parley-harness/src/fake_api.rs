//! In-memory stand-in for the host's HTTP endpoints.
//!
//! Responses are canned per user. A history request can be held behind a
//! [`Gate`] so tests decide when it completes relative to other inputs.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use futures::channel::oneshot;
use parley_app::ChatApi;
use parley_core::{Conversation, DirectoryUser, Message, UserId};
use thiserror::Error;

/// Request received by a [`FakeApi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCall {
    /// `fetch_self`
    FetchSelf,
    /// `fetch_dialogs`
    FetchDialogs,
    /// `fetch_history`
    FetchHistory(UserId),
    /// `fetch_users`
    FetchUsers,
    /// `mark_all_read`
    MarkAllRead(UserId),
}

/// Failure injected into a [`FakeApi`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fake api: {0}")]
pub struct FakeApiError(pub String);

/// Holds back one simulated response until released or dropped.
#[derive(Debug)]
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    /// A closed gate and the receiver that waits on it.
    pub(crate) fn closed() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Let the held response complete.
    pub fn release(self) {
        // The receiver is gone if the request was never made; nothing to wake.
        let _ = self.0.send(());
    }
}

struct State {
    me: DirectoryUser,
    dialogs: Result<Vec<Conversation>, FakeApiError>,
    users: Vec<DirectoryUser>,
    histories: HashMap<UserId, Vec<Message>>,
    failing_histories: HashSet<UserId>,
    gates: HashMap<UserId, oneshot::Receiver<()>>,
    calls: Vec<ApiCall>,
}

/// [`ChatApi`] backed by canned data. Clones share state.
#[derive(Clone)]
pub struct FakeApi {
    state: Rc<RefCell<State>>,
}

impl FakeApi {
    /// Serve `me` as the local user, with no dialogs, users or history.
    pub fn new(me: DirectoryUser) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                me,
                dialogs: Ok(Vec::new()),
                users: Vec::new(),
                histories: HashMap::new(),
                failing_histories: HashSet::new(),
                gates: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// Serve `dialogs` from `fetch_dialogs`.
    #[must_use]
    pub fn with_dialogs(self, dialogs: Vec<Conversation>) -> Self {
        self.state.borrow_mut().dialogs = Ok(dialogs);
        self
    }

    /// Fail `fetch_dialogs`.
    #[must_use]
    pub fn failing_dialogs(self, reason: &str) -> Self {
        self.state.borrow_mut().dialogs = Err(FakeApiError(reason.to_owned()));
        self
    }

    /// Serve `users` from `fetch_users`.
    #[must_use]
    pub fn with_users(self, users: Vec<DirectoryUser>) -> Self {
        self.state.borrow_mut().users = users;
        self
    }

    /// Serve `messages` as the history with `user`.
    #[must_use]
    pub fn with_history(self, user: UserId, messages: Vec<Message>) -> Self {
        self.state.borrow_mut().histories.insert(user, messages);
        self
    }

    /// Fail every history request for `user`.
    #[must_use]
    pub fn failing_history(self, user: UserId) -> Self {
        self.state.borrow_mut().failing_histories.insert(user);
        self
    }

    /// Hold the next history request for `user` until the gate is released.
    pub fn hold_history(&self, user: UserId) -> Gate {
        let (gate, rx) = Gate::closed();
        self.state.borrow_mut().gates.insert(user, rx);
        gate
    }

    /// Requests received so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, call: ApiCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl ChatApi for FakeApi {
    type Error = FakeApiError;

    async fn fetch_self(&self) -> Result<DirectoryUser, FakeApiError> {
        self.record(ApiCall::FetchSelf);
        Ok(self.state.borrow().me.clone())
    }

    async fn fetch_dialogs(&self) -> Result<Vec<Conversation>, FakeApiError> {
        self.record(ApiCall::FetchDialogs);
        self.state.borrow().dialogs.clone()
    }

    async fn fetch_history(&self, user: UserId) -> Result<Vec<Message>, FakeApiError> {
        self.record(ApiCall::FetchHistory(user));
        let gate = self.state.borrow_mut().gates.remove(&user);
        if let Some(gate) = gate {
            // Released and dropped gates both open.
            let _ = gate.await;
        }

        let state = self.state.borrow();
        if state.failing_histories.contains(&user) {
            return Err(FakeApiError(format!("history with {user} unavailable")));
        }
        Ok(state.histories.get(&user).cloned().unwrap_or_default())
    }

    async fn fetch_users(&self) -> Result<Vec<DirectoryUser>, FakeApiError> {
        self.record(ApiCall::FetchUsers);
        Ok(self.state.borrow().users.clone())
    }

    async fn mark_all_read(&self, user: UserId) -> Result<(), FakeApiError> {
        self.record(ApiCall::MarkAllRead(user));
        Ok(())
    }
}

impl std::fmt::Debug for FakeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeApi").field("calls", &self.state.borrow().calls).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use futures::{FutureExt, executor::block_on};

    use super::*;

    fn me() -> DirectoryUser {
        DirectoryUser { id: UserId(1), username: "me".into() }
    }

    #[test]
    fn records_calls_in_order() {
        let api = FakeApi::new(me());
        block_on(async {
            api.fetch_self().await.unwrap();
            api.fetch_history(UserId(2)).await.unwrap();
            api.mark_all_read(UserId(2)).await.unwrap();
        });

        assert_eq!(
            api.calls(),
            [ApiCall::FetchSelf, ApiCall::FetchHistory(UserId(2)), ApiCall::MarkAllRead(UserId(2))]
        );
    }

    #[test]
    fn held_history_waits_for_release() {
        let api = FakeApi::new(me()).with_history(UserId(2), Vec::new());
        let gate = api.hold_history(UserId(2));

        let mut fetch = api.fetch_history(UserId(2)).boxed_local();
        assert!((&mut fetch).now_or_never().is_none());

        gate.release();
        assert_eq!(fetch.now_or_never(), Some(Ok(Vec::new())));
    }

    #[test]
    fn failing_history_reports_user() {
        let api = FakeApi::new(me()).failing_history(UserId(4));
        let err = block_on(api.fetch_history(UserId(4))).unwrap_err();
        assert!(err.to_string().contains('4'));
    }
}
