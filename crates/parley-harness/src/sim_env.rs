//! Simulated environment: seeded RNG and a virtual clock.
//!
//! Given the same seed, every placeholder id and every timestamp is the same
//! across runs. Sleeping advances the virtual clock instead of waiting.

use std::{cell::RefCell, rc::Rc, time::Duration};

use parley_core::{Environment, Timestamp};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

struct State {
    rng: ChaCha8Rng,
    start: Timestamp,
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// Deterministic [`Environment`]. Clones share the clock and RNG.
#[derive(Clone)]
pub struct SimEnv {
    state: Rc<RefCell<State>>,
}

impl SimEnv {
    /// Virtual time at creation: 2023-11-14T22:13:20Z.
    pub const DEFAULT_START: Timestamp = 1_700_000_000;

    /// Create an environment seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                rng: ChaCha8Rng::seed_from_u64(seed),
                start: Self::DEFAULT_START,
                elapsed: Duration::ZERO,
                sleeps: Vec::new(),
            })),
        }
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, duration: Duration) {
        self.state.borrow_mut().elapsed += duration;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.borrow().sleeps.clone()
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Timestamp {
        let state = self.state.borrow();
        state.start + state.elapsed.as_secs() as Timestamp
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state.borrow_mut();
        state.elapsed += duration;
        state.sleeps.push(duration);
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.state.borrow_mut().rng.fill_bytes(buffer);
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("elapsed", &self.state.borrow().elapsed).finish_non_exhaustive()
    }
}
