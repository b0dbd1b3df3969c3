//! Playback sessions
//!
//! One session per displayed camera. A session owns its surface and at most
//! one decoder instance, classifies decoder errors and drives the retry
//! state machine:
//!
//! ```text
//!                 endpoint set                manifest parsed / first fragment
//!   ┌──────────┐ ─────────────► ┌─────────┐ ─────────────────────────► ┌─────────┐
//!   │ NoStream │                │ Loading │                            │ Playing │
//!   └──────────┘ ◄───────────── └─────────┘ ◄─┐                        └─────────┘
//!        ▲        endpoint cleared   │  ▲     │ network error                │
//!        │                           │  │     │ (retry n/3, backoff n*2s)    │
//!        │                fatal      │  │     └──────────────────────────────┤
//!        │                           ▼  │ manual retry                      │
//!        │                        ┌───────┐     retries exhausted / fatal   │
//!        └─────────────────────── │ Error │ ◄───────────────────────────────┘
//!                                 └───────┘
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod fault;
pub mod handle;
pub mod session;
pub mod state;
pub mod stats;

pub use backend::{
    DecoderEvent, EventSink, PlayRejected, PlaybackEnvironment, PlaybackSurface, StreamingClient,
    SurfaceId,
};
pub use config::PlaybackConfig;
pub use context::{NoopObserver, SessionContext, SessionObserver};
pub use fault::{classify, DecoderError, ErrorKind, FaultClass, Recovery};
pub use handle::SessionHandle;
pub use session::{BackoffTicket, PlaybackSession};
pub use state::{PlaybackState, SessionSnapshot, SurfaceOptions};
pub use stats::SessionStats;
