//! Session configuration.

use parley_client::{ReconnectPolicy, TransportConfig};

/// Session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Acknowledge incoming messages in the active conversation as soon as
    /// they arrive.
    pub auto_read_receipts: bool,
    /// Outbox sizing.
    pub transport: TransportConfig,
    /// Backoff for re-establishing a lost connection.
    pub reconnect: ReconnectPolicy,
}

impl SessionConfig {
    /// Default for [`SessionConfig::auto_read_receipts`].
    pub const DEFAULT_AUTO_READ_RECEIPTS: bool = true;
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_read_receipts: Self::DEFAULT_AUTO_READ_RECEIPTS,
            transport: TransportConfig::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}
