use std::time::Duration;

use crate::shared::constants::{AUTO_SUBMIT_DELAY, POLL_INTERVAL};

/// Timing knobs for a session. Defaults are the production values; tests
/// shrink them.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Period of the live detection loop.
    pub poll_interval: Duration,
    /// How long a positive detection must stand before auto check-in.
    pub auto_submit_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            auto_submit_delay: AUTO_SUBMIT_DELAY,
        }
    }
}
