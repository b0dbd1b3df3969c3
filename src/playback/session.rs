//! Playback session state machine
//!
//! A [`PlaybackSession`] owns one camera's surface and at most one decoder
//! instance. It consumes decoder events and owner commands and resolves
//! every failure into either a recovery action or the `Error` state; it never
//! returns errors to its caller.
//!
//! The session does not own a clock. A scheduled reconnection is exposed as
//! a [`BackoffTicket`]; the driver arms a timer for it and reports back with
//! [`PlaybackSession::on_backoff_elapsed`]. Tickets are invalidated by any
//! transition that cancels the reconnection, so a late timer is a no-op.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use super::backend::{DecoderEvent, EventSink, PlaybackSurface, StreamingClient, TaggedEvent};
use super::context::SessionContext;
use super::fault::{classify, DecoderError, ErrorKind, FaultClass, Recovery};
use super::state::{PlaybackState, SessionSnapshot, SurfaceOptions};
use super::stats::SessionStats;
use crate::camera::{CameraDescriptor, CameraId};

/// A scheduled network reconnection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffTicket {
    /// Unique per session; stale tickets are ignored
    pub id: u64,
    /// Reconnection attempt number (1-based)
    pub attempt: u32,
    /// Delay before the attempt
    pub delay: Duration,
}

/// The decoder currently attached to the surface
enum Decoder {
    Streaming(Box<dyn StreamingClient>),
    /// Surface is playing the endpoint natively
    Native,
}

/// State machine for one camera's playback pipeline
pub struct PlaybackSession {
    camera_id: CameraId,
    endpoint: Option<Url>,
    state: PlaybackState,
    retry_count: u32,
    last_error: Option<String>,
    options: SurfaceOptions,
    ctx: SessionContext,
    surface: Box<dyn PlaybackSurface>,
    decoder: Option<Decoder>,

    /// Generation of the attached decoder; bumped on every attach and teardown
    generation: u64,
    events_tx: mpsc::UnboundedSender<TaggedEvent>,

    pending_backoff: Option<BackoffTicket>,
    next_ticket: u64,

    load_started_at: Option<Instant>,
    stats: SessionStats,
    destroyed: bool,
}

impl PlaybackSession {
    /// Create a session in `NoStream`; call [`start`](Self::start) to begin loading
    pub fn new(
        camera: &CameraDescriptor,
        options: SurfaceOptions,
        ctx: SessionContext,
        events_tx: mpsc::UnboundedSender<TaggedEvent>,
    ) -> Self {
        let surface = ctx.environment.create_surface(&camera.id, &options);

        Self {
            camera_id: camera.id.clone(),
            endpoint: camera.stream_endpoint.clone(),
            state: PlaybackState::NoStream,
            retry_count: 0,
            last_error: None,
            options,
            ctx,
            surface,
            decoder: None,
            generation: 0,
            events_tx,
            pending_backoff: None,
            next_ticket: 0,
            load_started_at: None,
            stats: SessionStats::new(),
            destroyed: false,
        }
    }

    /// Begin loading if an endpoint is present
    pub fn start(&mut self) {
        if self.endpoint.is_some() {
            self.begin_loading();
        } else {
            tracing::debug!(camera = %self.camera_id, "No stream endpoint");
        }
    }

    pub fn camera_id(&self) -> &CameraId {
        &self.camera_id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    pub fn options(&self) -> SurfaceOptions {
        self.options
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The reconnection currently waiting on a timer, if any
    pub fn pending_backoff(&self) -> Option<BackoffTicket> {
        self.pending_backoff
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            camera_id: self.camera_id.clone(),
            state: self.state,
            retry_count: self.retry_count,
            max_retries: self.ctx.config.max_retries,
            last_error: self.last_error.clone(),
            autoplay: self.options.autoplay,
            muted: self.options.muted,
            stats: self.stats.clone(),
        }
    }

    /// Process an event reported by a decoder
    pub fn handle_event(&mut self, generation: u64, event: DecoderEvent) {
        if self.destroyed || generation != self.generation || self.decoder.is_none() {
            tracing::trace!(
                camera = %self.camera_id,
                generation = generation,
                current = self.generation,
                ?event,
                "Discarding event from stale decoder"
            );
            return;
        }

        match event {
            DecoderEvent::MediaAttached => {
                tracing::debug!(camera = %self.camera_id, "Media attached");
            }
            DecoderEvent::ManifestParsed => self.on_media_ready("manifest parsed"),
            DecoderEvent::FragmentLoaded { bytes } => {
                self.stats.record_fragment(bytes);
                self.on_media_ready("first fragment loaded");
            }
            DecoderEvent::DataLoaded => self.on_media_ready("native data loaded"),
            DecoderEvent::Error(error) => self.on_decoder_error(error),
            DecoderEvent::NativeError(details) => self.on_native_error(details),
        }
    }

    /// Timer for `ticket` expired; resume loading if it is still current
    pub fn on_backoff_elapsed(&mut self, ticket: u64) {
        match self.pending_backoff {
            Some(pending) if pending.id == ticket => {}
            _ => {
                tracing::debug!(camera = %self.camera_id, ticket = ticket, "Stale backoff timer");
                return;
            }
        }

        self.pending_backoff = None;
        if self.destroyed || !self.state.is_live() {
            return;
        }

        tracing::info!(
            camera = %self.camera_id,
            attempt = self.retry_count,
            max_retries = self.ctx.config.max_retries,
            "Reconnecting stream"
        );
        self.resume_decoder();
    }

    /// Manual retry from `Error`; ignored in any other state
    pub fn retry(&mut self) {
        if self.destroyed || self.state != PlaybackState::Error {
            tracing::debug!(camera = %self.camera_id, state = ?self.state, "Retry ignored");
            return;
        }

        self.stats.manual_retries += 1;
        self.retry_count = 0;
        self.last_error = None;

        tracing::info!(camera = %self.camera_id, "Manual retry");

        if self.endpoint.is_some() {
            self.begin_loading();
        } else {
            self.state = PlaybackState::NoStream;
        }
    }

    /// Replace the endpoint; the current decoder is destroyed first
    pub fn set_endpoint(&mut self, endpoint: Option<Url>) {
        if self.destroyed || endpoint == self.endpoint {
            return;
        }

        tracing::info!(
            camera = %self.camera_id,
            endpoint = ?endpoint.as_ref().map(Url::as_str),
            "Stream endpoint changed"
        );

        self.pending_backoff = None;
        self.teardown_decoder();
        self.endpoint = endpoint;
        self.retry_count = 0;
        self.last_error = None;

        if self.endpoint.is_some() {
            self.begin_loading();
        } else {
            self.state = PlaybackState::NoStream;
        }
    }

    /// Apply new surface options
    pub fn configure(&mut self, options: SurfaceOptions) {
        if self.destroyed || options == self.options {
            return;
        }
        self.options = options;
        self.surface.configure(&options);
    }

    /// Cancel any pending reconnection and release the decoder and surface
    ///
    /// Idempotent; also runs on drop.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.pending_backoff = None;
        self.teardown_decoder();
        self.surface.release();
        self.destroyed = true;

        tracing::debug!(camera = %self.camera_id, "Session destroyed");
    }

    fn begin_loading(&mut self) {
        self.state = PlaybackState::Loading;
        self.load_started_at = Some(Instant::now());
        self.ctx.observer.on_load_start(&self.camera_id);

        tracing::info!(camera = %self.camera_id, "Loading stream");

        self.resume_decoder();
    }

    /// Resume the attached decoder, or create one if none remains
    fn resume_decoder(&mut self) {
        match self.decoder.as_mut() {
            Some(Decoder::Streaming(client)) => client.start_load(),
            Some(Decoder::Native) => self.reload_native(),
            None => self.initialize_decoder(),
        }
    }

    fn initialize_decoder(&mut self) {
        let Some(url) = self.endpoint.clone() else {
            return;
        };

        self.teardown_decoder();
        self.generation += 1;
        let sink = EventSink::new(self.generation, self.events_tx.clone());

        if let Some(mut client) = self
            .ctx
            .environment
            .create_streaming_client(&self.camera_id, sink.clone())
        {
            client.load_source(&url);
            client.attach_media(self.surface.id());
            self.decoder = Some(Decoder::Streaming(client));

            tracing::debug!(
                camera = %self.camera_id,
                generation = self.generation,
                surface = %self.surface.id(),
                "Streaming client attached"
            );
        } else if self.surface.supports_native(&url) {
            self.surface.load_native(&url, sink);
            self.decoder = Some(Decoder::Native);

            tracing::debug!(
                camera = %self.camera_id,
                generation = self.generation,
                "Using native playback"
            );
        } else {
            tracing::warn!(
                camera = %self.camera_id,
                "No streaming client or native playback available"
            );
            self.fail(FaultClass::UnsupportedEnvironment, None);
            return;
        }

        self.stats.decoders_created += 1;
    }

    fn reload_native(&mut self) {
        let Some(url) = self.endpoint.clone() else {
            return;
        };

        self.surface.unload();
        self.generation += 1;
        let sink = EventSink::new(self.generation, self.events_tx.clone());
        self.surface.load_native(&url, sink);
    }

    /// Destroy the decoder; events it emitted afterwards become stale
    fn teardown_decoder(&mut self) {
        match self.decoder.take() {
            Some(Decoder::Streaming(mut client)) => client.destroy(),
            Some(Decoder::Native) => self.surface.unload(),
            None => return,
        }
        self.generation += 1;

        tracing::debug!(camera = %self.camera_id, "Decoder destroyed");
    }

    fn on_media_ready(&mut self, trigger: &'static str) {
        match self.state {
            PlaybackState::Loading => {
                self.state = PlaybackState::Playing;
                self.retry_count = 0;
                self.last_error = None;
                self.pending_backoff = None;

                if let Some(started) = self.load_started_at.take() {
                    self.stats.record_startup(started.elapsed());
                }

                tracing::info!(camera = %self.camera_id, trigger = trigger, "Stream playing");

                self.ctx.observer.on_load_complete(&self.camera_id, true);
                self.try_autoplay();
            }
            PlaybackState::Playing if self.retry_count > 0 => {
                tracing::info!(
                    camera = %self.camera_id,
                    retries = self.retry_count,
                    "Stream recovered"
                );
                self.retry_count = 0;
                self.pending_backoff = None;
            }
            _ => {}
        }
    }

    fn try_autoplay(&mut self) {
        if !self.options.autoplay {
            return;
        }
        if let Err(e) = self.surface.play() {
            tracing::debug!(camera = %self.camera_id, error = %e, "Autoplay blocked");
        }
    }

    fn on_decoder_error(&mut self, error: DecoderError) {
        if !self.state.is_live() {
            tracing::debug!(camera = %self.camera_id, %error, "Error outside live state ignored");
            return;
        }

        if error.fatal && error.kind == ErrorKind::Network && self.pending_backoff.is_some() {
            tracing::debug!(camera = %self.camera_id, %error, "Reconnect already pending");
            return;
        }

        match classify(&error, self.retry_count, &self.ctx.config) {
            Recovery::Ignore => {
                tracing::debug!(camera = %self.camera_id, %error, "Non-fatal decoder error");
            }
            Recovery::Reconnect { attempt, delay } => {
                self.retry_count = attempt;
                self.next_ticket += 1;
                self.pending_backoff = Some(BackoffTicket {
                    id: self.next_ticket,
                    attempt,
                    delay,
                });
                self.stats.network_retries += 1;

                tracing::warn!(
                    camera = %self.camera_id,
                    attempt = attempt,
                    max_retries = self.ctx.config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "Network error, reconnect scheduled"
                );
            }
            Recovery::RecoverMedia => {
                self.stats.media_recoveries += 1;
                tracing::warn!(camera = %self.camera_id, %error, "Media error, recovering");

                if let Some(Decoder::Streaming(client)) = self.decoder.as_mut() {
                    client.recover_media_error();
                }
            }
            Recovery::Fail(class) => {
                tracing::warn!(camera = %self.camera_id, %error, "Fatal decoder error");
                self.fail(class, Some(&error.details));
            }
        }
    }

    fn on_native_error(&mut self, details: String) {
        if !self.state.is_live() {
            return;
        }

        if self.ctx.config.retry_native_errors {
            self.on_decoder_error(DecoderError::network(details));
        } else {
            tracing::warn!(camera = %self.camera_id, details = %details, "Native playback error");
            self.fail(FaultClass::OtherFatal, None);
        }
    }

    fn fail(&mut self, class: FaultClass, details: Option<&str>) {
        self.pending_backoff = None;
        if class.destroys_decoder() {
            self.teardown_decoder();
        }

        let message = match details {
            Some(d) if class == FaultClass::OtherFatal && !d.is_empty() => {
                format!("{}: {}", class.user_message(), d)
            }
            _ => class.user_message().to_string(),
        };

        let was_loading = self.state == PlaybackState::Loading;
        self.state = PlaybackState::Error;
        self.last_error = Some(message.clone());
        self.load_started_at = None;

        tracing::error!(
            camera = %self.camera_id,
            fault = ?class,
            message = %message,
            "Playback failed"
        );

        if was_loading {
            self.ctx.observer.on_load_complete(&self.camera_id, false);
        }
        self.ctx.observer.on_error(&self.camera_id, &message);
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.destroy();
    }
}
