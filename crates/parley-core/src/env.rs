//! Environment abstraction for deterministic testing.
//!
//! Decouples chat logic from system resources (time, randomness). Enables
//! deterministic simulation (virtual clock, seeded RNG) and production use
//! with real system resources.

use std::time::Duration;

use crate::model::Timestamp;

/// Abstract environment providing time, randomness, and sleeping.
///
/// Implementations MUST guarantee that `now()` never goes backwards within a
/// session; the timeline's ordering relies on locally stamped times being
/// non-decreasing.
pub trait Environment: Clone + 'static {
    /// Current wall-clock time in Unix seconds.
    fn now(&self) -> Timestamp;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code (reconnect backoff) sleeps; state machines never do.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()>;

    /// Fills the provided buffer with random bytes.
    ///
    /// Given the same seed, simulation implementations produce the same
    /// sequence.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
