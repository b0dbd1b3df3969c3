//! Collaborator interfaces
//!
//! The session drives a third-party streaming client and the host's playback
//! surface through these traits. Both report back through an [`EventSink`],
//! which tags every event with the decoder generation that produced it so a
//! session can discard events from instances it has already destroyed.

use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use super::fault::DecoderError;
use super::state::SurfaceOptions;
use crate::camera::CameraId;

/// Events reported by a decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    /// Streaming client bound to the surface
    MediaAttached,
    /// Manifest fully parsed
    ManifestParsed,
    /// A media fragment finished loading
    FragmentLoaded { bytes: Option<u64> },
    /// Native playback has enough data to render
    DataLoaded,
    /// Streaming client error
    Error(DecoderError),
    /// Native playback error (the surface reports no classification)
    NativeError(String),
}

pub(crate) type TaggedEvent = (u64, DecoderEvent);

/// Channel end handed to a decoder for reporting events
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl EventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { generation, tx }
    }

    /// Decoder generation this sink reports for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report an event; returns false once the session is gone
    pub fn emit(&self, event: DecoderEvent) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }

    /// Whether the receiving session has shut down
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Identifier of a playback surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Playback refused by the host, e.g. an autoplay policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Playback rejected: {0}")]
pub struct PlayRejected(pub String);

/// Segmented-streaming client library (one instance per decoder)
pub trait StreamingClient: Send {
    fn load_source(&mut self, url: &Url);

    fn attach_media(&mut self, surface: SurfaceId);

    /// Resume loading after a stop or network failure
    fn start_load(&mut self);

    fn recover_media_error(&mut self);

    /// Release all resources; no events may be emitted afterwards
    fn destroy(&mut self);
}

/// Host render target, optionally able to play a URL natively
pub trait PlaybackSurface: Send {
    fn id(&self) -> SurfaceId;

    /// Apply autoplay, mute and controls settings
    fn configure(&mut self, options: &SurfaceOptions);

    /// Whether the host can play `url` without the streaming client
    fn supports_native(&self, url: &Url) -> bool;

    /// Set the source for native playback
    fn load_native(&mut self, url: &Url, sink: EventSink);

    /// Clear any native source
    fn unload(&mut self);

    /// Start rendering
    fn play(&mut self) -> Result<(), PlayRejected>;

    /// Called once when the owning session is destroyed
    fn release(&mut self) {}
}

/// Factory for decoders and surfaces
pub trait PlaybackEnvironment: Send + Sync {
    /// Create a streaming client, or `None` when the library is unavailable
    fn create_streaming_client(
        &self,
        camera: &CameraId,
        sink: EventSink,
    ) -> Option<Box<dyn StreamingClient>>;

    fn create_surface(&self, camera: &CameraId, options: &SurfaceOptions)
        -> Box<dyn PlaybackSurface>;
}
