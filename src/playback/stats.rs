//! Statistics for playback sessions

use std::time::Duration;

use serde::Serialize;

/// Session-level statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    /// Media fragments loaded since the session was created
    pub fragments_loaded: u64,
    /// Fragment bytes reported by the streaming client
    pub bytes_loaded: u64,
    /// Network reconnections scheduled
    pub network_retries: u64,
    /// In-place media error recoveries
    pub media_recoveries: u64,
    /// Manual retries requested by the owner
    pub manual_retries: u64,
    /// Decoder instances created
    pub decoders_created: u64,
    /// Time from the most recent load start to `Playing`
    pub startup_latency_ms: Option<u64>,
}

impl SessionStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a loaded fragment
    pub fn record_fragment(&mut self, bytes: Option<u64>) {
        self.fragments_loaded += 1;
        if let Some(bytes) = bytes {
            self.bytes_loaded += bytes;
        }
    }

    /// Record how long the last load took to start playing
    pub fn record_startup(&mut self, elapsed: Duration) {
        self.startup_latency_ms = Some(elapsed.as_millis() as u64);
    }
}
