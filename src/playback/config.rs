//! Playback session configuration

use std::time::Duration;

/// Network reconnections allowed before a session gives up
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff grows by this much per attempt (2s, 4s, 6s)
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(2000);

/// Playback session configuration options
///
/// By default native playback errors are retried like network errors, with
/// the same backoff and retry limit. Use `retry_native_errors(false)` for
/// the stricter behavior where any native error goes straight to `Error`
/// with the generic "Playback failed" message.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Maximum consecutive network reconnections
    pub max_retries: u32,

    /// Linear backoff step; attempt `n` waits `n * backoff_step`
    pub backoff_step: Duration,

    /// Route native playback errors through the network backoff.
    /// When disabled, a native error fails the session immediately.
    pub retry_native_errors: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_step: DEFAULT_BACKOFF_STEP,
            retry_native_errors: true,
        }
    }
}

impl PlaybackConfig {
    /// Set the maximum number of network reconnections
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the backoff step
    pub fn backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    /// Enable or disable backoff for native playback errors
    pub fn retry_native_errors(mut self, enabled: bool) -> Self {
        self.retry_native_errors = enabled;
        self
    }

    /// Delay before reconnection attempt `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}
