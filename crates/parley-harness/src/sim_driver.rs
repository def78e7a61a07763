//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` plays a script of inputs into the same
//! [`parley_app::Runtime`] the CLI uses. Connections are
//! [`RecordingConnection`]s; every render is recorded and, optionally,
//! checked against an [`InvariantRegistry`]. A connect attempt can be held
//! behind a [`Gate`] to script inputs that arrive while it is pending.
//!
//! The runtime consumes the driver, so tests observe it through a
//! [`SimHandle`] taken beforehand.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use futures::{
    FutureExt,
    channel::oneshot,
    future::LocalBoxFuture,
};
use parley_app::{Driver, DriverInput, SessionView, UserCommand};
use parley_client::Connection;
use parley_core::UserId;
use thiserror::Error;

use crate::{fake_api::Gate, invariants::InvariantRegistry, sim_connection::RecordingConnection};

/// Error type for simulation driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimDriverError {
    /// A scripted connect failure.
    #[error("connection refused")]
    ConnectRefused,
    /// A rendered view broke an invariant.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

enum Step {
    Input(DriverInput),
    Call(Box<dyn FnOnce()>),
}

#[derive(Default)]
struct SharedState {
    script: VecDeque<Step>,
    refused_connects: u32,
    connect_attempts: u32,
    held_connect: Option<(u32, oneshot::Receiver<()>)>,
    connections: Vec<RecordingConnection>,
    renders: Vec<SessionView>,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// When the script runs out the driver answers [`DriverInput::Quit`].
#[derive(Default)]
pub struct SimDriver {
    state: Rc<RefCell<SharedState>>,
    invariants: Option<InvariantRegistry>,
}

impl SimDriver {
    /// Create a driver with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Refuse the next `count` connection attempts.
    #[must_use]
    pub fn refusing_connects(self, count: u32) -> Self {
        self.state.borrow_mut().refused_connects = count;
        self
    }

    /// Hold connect attempt number `attempt` (counting from 1, refused ones
    /// included) until the gate is released.
    pub fn hold_connect(&self, attempt: u32) -> Gate {
        let (gate, rx) = Gate::closed();
        self.state.borrow_mut().held_connect = Some((attempt, rx));
        gate
    }

    /// Handle for inspecting the driver after the runtime took it.
    pub fn handle(&self) -> SimHandle {
        SimHandle { state: Rc::clone(&self.state) }
    }

    /// Queue an input.
    pub fn push(&self, input: DriverInput) {
        self.state.borrow_mut().script.push_back(Step::Input(input));
    }

    /// Queue a raw server frame.
    pub fn push_frame(&self, raw: impl Into<String>) {
        self.push(DriverInput::Frame(raw.into()));
    }

    /// Queue a user command.
    pub fn push_command(&self, command: UserCommand) {
        self.push(DriverInput::Command(command));
    }

    /// Queue a conversation selection.
    pub fn push_select(&self, user_id: UserId) {
        self.push_command(UserCommand::Select { user_id });
    }

    /// Queue a message send.
    pub fn push_send(&self, text: &str) {
        self.push_command(UserCommand::Send { text: text.to_owned() });
    }

    /// Queue a callback run when the script reaches it, before the next input
    /// is handed out. Use it to release gates or to close connections.
    pub fn push_call(&self, call: impl FnOnce() + 'static) {
        self.state.borrow_mut().script.push_back(Step::Call(Box::new(call)));
    }

    /// Queue a disconnect notification.
    pub fn push_disconnect(&self) {
        self.push(DriverInput::Disconnected);
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn next_input(&mut self) -> Result<DriverInput, SimDriverError> {
        loop {
            let step = self.state.borrow_mut().script.pop_front();
            match step {
                Some(Step::Input(input)) => return Ok(input),
                Some(Step::Call(call)) => call(),
                None => return Ok(DriverInput::Quit),
            }
        }
    }

    type Link = RecordingConnection;

    fn connect(&self) -> LocalBoxFuture<'static, Result<RecordingConnection, SimDriverError>> {
        let state = Rc::clone(&self.state);
        async move {
            let held = {
                let mut state = state.borrow_mut();
                state.connect_attempts += 1;
                let attempt = state.connect_attempts;
                match state.held_connect.take() {
                    Some((at, rx)) if at == attempt => Some(rx),
                    other => {
                        state.held_connect = other;
                        None
                    },
                }
            };
            if let Some(rx) = held {
                // Released and dropped gates both open.
                let _ = rx.await;
            }

            let mut state = state.borrow_mut();
            if state.refused_connects > 0 {
                state.refused_connects -= 1;
                return Err(SimDriverError::ConnectRefused);
            }
            Ok(RecordingConnection::new())
        }
        .boxed_local()
    }

    fn install(&mut self, link: RecordingConnection) -> Box<dyn Connection> {
        self.state.borrow_mut().connections.push(link.clone());
        Box::new(link)
    }

    fn render(&mut self, view: &SessionView) -> Result<(), SimDriverError> {
        if let Some(registry) = &self.invariants {
            registry.check_all(view).map_err(|violations| {
                let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
                SimDriverError::Invariant(messages.join("; "))
            })?;
        }
        self.state.borrow_mut().renders.push(view.clone());
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.stopped = true;
        for connection in &state.connections {
            connection.close();
        }
    }
}

/// Read access to a [`SimDriver`] owned by a runtime.
#[derive(Clone)]
pub struct SimHandle {
    state: Rc<RefCell<SharedState>>,
}

impl SimHandle {
    /// Connections established so far, oldest first.
    pub fn connections(&self) -> Vec<RecordingConnection> {
        self.state.borrow().connections.clone()
    }

    /// The most recent connection.
    pub fn last_connection(&self) -> Option<RecordingConnection> {
        self.state.borrow().connections.last().cloned()
    }

    /// Connection attempts made, refused ones included.
    pub fn connect_attempts(&self) -> u32 {
        self.state.borrow().connect_attempts
    }

    /// Every rendered view, in order.
    pub fn renders(&self) -> Vec<SessionView> {
        self.state.borrow().renders.clone()
    }

    /// The most recently rendered view.
    pub fn last_view(&self) -> Option<SessionView> {
        self.state.borrow().renders.last().cloned()
    }

    /// Whether the runtime stopped the driver.
    pub fn stopped(&self) -> bool {
        self.state.borrow().stopped
    }
}

impl std::fmt::Debug for SimHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SimHandle")
            .field("scripted", &state.script.len())
            .field("connections", &state.connections.len())
            .field("renders", &state.renders.len())
            .finish_non_exhaustive()
    }
}
