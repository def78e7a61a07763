//! Deterministic simulation harness for Parley.
//!
//! Simulation implementations of the engine's seams: [`SimEnv`] for time and
//! randomness, [`RecordingConnection`] for the socket, [`SimDriver`] for
//! input and rendering, and [`FakeApi`] for the host's HTTP endpoints. The
//! same [`parley_app::Runtime`] that runs in production runs on top of them.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties of every rendered
//! [`SessionView`](parley_app::SessionView). Use
//! [`InvariantRegistry::standard()`] for the timeline and conversation list
//! invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fake_api;
pub mod frames;
pub mod invariants;
pub mod sim_connection;
pub mod sim_driver;
pub mod sim_env;

pub use fake_api::{ApiCall, FakeApi, FakeApiError, Gate};
pub use invariants::{
    ConversationsUnique, Invariant, InvariantRegistry, InvariantResult, TimelineBelongsToActive,
    TimelineOrdered, UniqueMessageIds, Violation,
};
pub use sim_connection::RecordingConnection;
pub use sim_driver::{SimDriver, SimDriverError, SimHandle};
pub use sim_env::SimEnv;
