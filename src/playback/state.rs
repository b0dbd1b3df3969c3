//! Session state types
//!
//! The externally visible state of a playback session and the snapshot
//! published to owners after every processed input.

use serde::Serialize;

use super::stats::SessionStats;
use crate::camera::CameraId;

/// Playback lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Camera has no endpoint; nothing is loaded
    NoStream,
    /// Decoder is loading (also during network backoff)
    Loading,
    /// Media is flowing
    Playing,
    /// Terminal until a manual retry or endpoint change
    Error,
}

impl PlaybackState {
    /// Whether decoder events are meaningful in this state
    pub fn is_live(&self) -> bool {
        matches!(self, PlaybackState::Loading | PlaybackState::Playing)
    }
}

/// Per-view presentation settings for a session's surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurfaceOptions {
    /// Attempt playback as soon as media is ready
    pub autoplay: bool,
    /// Audio muted
    pub muted: bool,
    /// Show user playback controls
    pub controls: bool,
}

impl SurfaceOptions {
    /// Tiled preview: muted autoplay, no controls
    pub const fn grid() -> Self {
        Self {
            autoplay: true,
            muted: true,
            controls: false,
        }
    }

    /// Full-screen view: autoplay with audio and controls
    pub const fn focused() -> Self {
        Self {
            autoplay: true,
            muted: false,
            controls: true,
        }
    }

    /// Combine the requests of several viewers of one surface
    ///
    /// Audio is unmuted and controls shown if any viewer asks for it.
    pub fn merge(self, other: SurfaceOptions) -> Self {
        Self {
            autoplay: self.autoplay || other.autoplay,
            muted: self.muted && other.muted,
            controls: self.controls || other.controls,
        }
    }
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self::grid()
    }
}

/// Immutable view of a session for rendering
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub camera_id: CameraId,
    pub state: PlaybackState,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
    pub autoplay: bool,
    pub muted: bool,
    pub stats: SessionStats,
}

impl SessionSnapshot {
    /// Whether a reconnection is in progress
    pub fn is_retrying(&self) -> bool {
        self.state.is_live() && self.retry_count > 0
    }

    /// Loading overlay label, e.g. `retry 2/3`
    pub fn retry_label(&self) -> Option<String> {
        if self.is_retrying() {
            Some(format!("retry {}/{}", self.retry_count, self.max_retries))
        } else {
            None
        }
    }

    /// Whether the owner should offer a manual retry action
    pub fn can_retry(&self) -> bool {
        self.state == PlaybackState::Error
    }
}
