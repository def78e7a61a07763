//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` reads the real wall clock, sleeps on the tokio timer and draws
//! randomness from the OS. Behavior is non-deterministic.

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::{Environment, model::Timestamp};

/// Production environment.
///
/// The wall clock may step backwards; `now()` then repeats the latest value it
/// returned until the clock catches up. Clones share that value.
///
/// # Panics
///
/// Panics if the OS RNG fails. Placeholder ids are then impossible to
/// generate, and such a failure indicates an OS-level problem.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv {
    latest: Rc<Cell<Timestamp>>,
}

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::disallowed_methods)]
    fn wall_clock() -> Timestamp {
        // A clock set before 1970 reads as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs() as Timestamp)
    }

    /// Clamp a wall-clock reading to the latest value handed out.
    fn monotonic(&self, wall: Timestamp) -> Timestamp {
        let now = wall.max(self.latest.get());
        self.latest.set(now);
        now
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Timestamp {
        self.monotonic(Self::wall_clock())
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_2020() {
        assert!(SystemEnv::new().now() > 1_577_836_800);
    }

    #[test]
    fn clock_steps_back_are_absorbed() {
        let env = SystemEnv::new();
        let shared = env.clone();

        assert_eq!(env.monotonic(100), 100);
        assert_eq!(shared.monotonic(90), 100);
        assert_eq!(env.monotonic(120), 120);
        assert!(shared.now() >= 120);
    }

    #[test]
    fn random_bytes_differ() {
        let env = SystemEnv::new();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        env.random_bytes(&mut a);
        env.random_bytes(&mut b);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn sleep_completes() {
        SystemEnv::new().sleep(Duration::from_millis(1)).await;
    }
}
