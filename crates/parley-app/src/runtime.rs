//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`ChatSession`]: stores and protocol state
//! - [`ChatApi`]: HTTP collaborator for initial data and history
//! - [`Driver`]: platform-specific I/O
//!
//! Everything runs on one logic thread. HTTP requests and connection
//! attempts are in flight concurrently, but their results are applied to the
//! session one at a time between inputs, so every bus publication happens on
//! this thread. Inputs keep flowing while the link is down.

use std::time::Duration;

use futures::{
    FutureExt, StreamExt,
    future::LocalBoxFuture,
    stream::FuturesUnordered,
};
use parley_core::{ChatError, Environment, Message, UserId};

use crate::{
    ChatApi, ChatSession, Driver, DriverInput, RuntimeError, SessionAction, SessionConfig,
    SessionView, UserCommand,
};

/// Result of one HTTP request issued for a [`SessionAction`].
enum Completion {
    History { user_id: UserId, result: Result<Vec<Message>, ChatError> },
    MarkRead { user_id: UserId, result: Result<(), ChatError> },
}

enum Step<L, E> {
    Completed(Completion),
    Linked(Result<L, E>),
    Input(DriverInput),
}

type InFlight = FuturesUnordered<LocalBoxFuture<'static, Completion>>;

/// Connection attempt, backoff delay included.
type Dial<L, E> = LocalBoxFuture<'static, Result<L, E>>;

/// Resolve the pending connection attempt. Never resolves without one.
async fn dialed<L: 'static, E: 'static>(dialing: &mut Option<Dial<L, E>>) -> Result<L, E> {
    match dialing {
        Some(dial) => dial.await,
        None => std::future::pending().await,
    }
}

/// Generic runtime that orchestrates a session, an API, and a driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `A`: HTTP collaborator
/// - `E`: Environment for time and randomness
pub struct Runtime<D, A, E>
where
    D: Driver,
    A: ChatApi,
    E: Environment,
{
    driver: D,
    api: A,
    env: E,
    config: SessionConfig,
    dialing: Option<Dial<D::Link, D::Error>>,
    /// Backoff attempts since the last successful connect.
    attempt: u32,
}

impl<D, A, E> Runtime<D, A, E>
where
    D: Driver,
    A: ChatApi,
    E: Environment,
{
    /// Create a new runtime.
    pub fn new(driver: D, api: A, env: E, config: SessionConfig) -> Self {
        Self { driver, api, env, config, dialing: None, attempt: 0 }
    }

    /// Run until the driver quits.
    ///
    /// 1. Identifies the local user and loads conversations and users
    /// 2. Starts connecting; failed attempts are retried per the reconnect
    ///    policy while inputs are handled
    /// 3. Applies HTTP completions, connection results and driver inputs, in
    ///    that order of preference
    ///
    /// Returns the final view.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Chat` if the local user cannot be identified
    /// - `RuntimeError::ReconnectExhausted` if the connection cannot be
    ///   (re-)established
    /// - `RuntimeError::Driver` on driver failure
    pub async fn run(mut self) -> Result<SessionView, RuntimeError<D::Error>> {
        let me = self.api.fetch_self().await.map_err(|e| ChatError::Fetch(e.to_string()))?;
        tracing::info!(user_id = %me.id, username = %me.username, "session starting");

        let mut session = ChatSession::new(self.env.clone(), self.config, me.id);
        self.initial_load(&mut session).await;
        self.dial(None);
        self.render(&session)?;

        let mut in_flight = InFlight::new();
        loop {
            let step = tokio::select! {
                biased;
                Some(completion) = in_flight.next(), if !in_flight.is_empty() => Step::Completed(completion),
                linked = dialed(&mut self.dialing) => Step::Linked(linked),
                input = self.driver.next_input() => Step::Input(input.map_err(RuntimeError::Driver)?),
            };

            match step {
                Step::Completed(completion) => Self::complete(&mut session, completion),
                Step::Linked(linked) => {
                    self.dialing = None;
                    self.linked(&mut session, linked)?;
                },
                Step::Input(DriverInput::Frame(raw)) => {
                    if let Err(error) = session.on_frame(&raw) {
                        tracing::debug!(%error, "frame dropped");
                    }
                },
                Step::Input(DriverInput::Command(command)) => {
                    self.command(&mut session, command, &mut in_flight);
                },
                Step::Input(DriverInput::Disconnected) => {
                    if self.dialing.is_some() {
                        tracing::debug!("disconnect while reconnecting ignored");
                    } else {
                        session.connection_lost();
                        self.redial()?;
                    }
                },
                Step::Input(DriverInput::Quit) => break,
            }

            self.render(&session)?;
        }

        self.driver.stop();
        Ok(session.view())
    }

    async fn initial_load(&self, session: &mut ChatSession<E>) {
        let (dialogs, users) = futures::join!(self.api.fetch_dialogs(), self.api.fetch_users());

        match dialogs {
            Ok(conversations) => session.load_conversations(conversations),
            Err(e) => session.report_failure(&ChatError::Fetch(e.to_string())),
        }
        match users {
            Ok(users) => session.load_directory(users),
            Err(e) => session.report_failure(&ChatError::Fetch(e.to_string())),
        }
    }

    /// Start a connection attempt after `delay`.
    fn dial(&mut self, delay: Option<Duration>) {
        let env = self.env.clone();
        let connect = self.driver.connect();
        self.dialing = Some(
            async move {
                if let Some(delay) = delay {
                    env.sleep(delay).await;
                }
                connect.await
            }
            .boxed_local(),
        );
    }

    /// Schedule the next backoff attempt, or give up.
    fn redial(&mut self) -> Result<(), RuntimeError<D::Error>> {
        self.attempt += 1;
        let Some(delay) = self.config.reconnect.delay(self.attempt) else {
            let attempts = self.attempt - 1;
            tracing::error!(attempts, "reconnect attempts exhausted");
            return Err(RuntimeError::ReconnectExhausted { attempts });
        };
        tracing::debug!(attempt = self.attempt, ?delay, "reconnect scheduled");
        self.dial(Some(delay));
        Ok(())
    }

    fn linked(
        &mut self,
        session: &mut ChatSession<E>,
        linked: Result<D::Link, D::Error>,
    ) -> Result<(), RuntimeError<D::Error>> {
        match linked {
            Ok(link) => {
                tracing::info!(attempt = self.attempt, "connected");
                self.attempt = 0;
                let connection = self.driver.install(link);
                session.attach(connection)?;
                Ok(())
            },
            Err(error) => {
                tracing::warn!(attempt = self.attempt, %error, "connect failed");
                self.redial()
            },
        }
    }

    fn command(&self, session: &mut ChatSession<E>, command: UserCommand, in_flight: &mut InFlight) {
        let outcome = match command {
            UserCommand::Select { user_id } => session.select(user_id).map(|actions| {
                in_flight.extend(actions.into_iter().map(|action| self.execute(action)));
            }),
            UserCommand::Send { text } => session.send_message(&text).map(|_| ()),
            UserCommand::Typing(typing) => session.notify_typing(typing),
            UserCommand::Search(query) => {
                session.search_users(&query);
                Ok(())
            },
        };

        if let Err(error) = outcome {
            session.report_failure(&error);
        }
    }

    /// Start the request for `action`. The future owns its API handle.
    fn execute(&self, action: SessionAction) -> LocalBoxFuture<'static, Completion> {
        let api = self.api.clone();
        match action {
            SessionAction::FetchHistory { user_id } => async move {
                let result = api.fetch_history(user_id).await.map_err(|e| ChatError::Fetch(e.to_string()));
                Completion::History { user_id, result }
            }
            .boxed_local(),
            SessionAction::MarkAllRead { user_id } => async move {
                let result = api.mark_all_read(user_id).await.map_err(|e| ChatError::Fetch(e.to_string()));
                Completion::MarkRead { user_id, result }
            }
            .boxed_local(),
        }
    }

    fn complete(session: &mut ChatSession<E>, completion: Completion) {
        match completion {
            Completion::History { user_id, result } => {
                session.history_loaded(user_id, result);
            },
            Completion::MarkRead { user_id, result } => session.mark_read_completed(user_id, result),
        }
    }

    fn render(&mut self, session: &ChatSession<E>) -> Result<(), RuntimeError<D::Error>> {
        self.driver.render(&session.view()).map_err(RuntimeError::Driver)
    }
}
