//! Live-view playback engine for CCTV consoles
//!
//! This crate keeps a wall of independently failing network video streams
//! alive. It does not decode media itself; the streaming client library and
//! the host's native playback surface are collaborators described by the
//! traits in [`playback::backend`].
//!
//! # Architecture
//!
//! ```text
//!   CameraInventory ──► GridOrchestrator ──┐         FocusedView
//!   (descriptors)       filter + paginate  │              │
//!                                          ▼              ▼
//!                               SessionRegistry (leases per camera)
//!                                          │
//!                 ┌────────────────────────┼────────────────────────┐
//!                 ▼                        ▼                        ▼
//!          SessionHandle            SessionHandle            SessionHandle
//!          (tokio task)             (tokio task)             (tokio task)
//!          PlaybackSession ◄── EventSink ── StreamingClient / PlaybackSurface
//! ```
//!
//! Each session runs its own state machine (`NoStream`, `Loading`, `Playing`,
//! `Error`) with bounded network retries and linear backoff. The grid bounds
//! how many sessions exist at once; the focused view adds at most one more.

pub mod camera;
pub mod console;
pub mod error;
pub mod focused;
pub mod grid;
pub mod playback;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use camera::{CameraDescriptor, CameraId, CameraInventory, JsonFileInventory, StaticInventory};
pub use console::{ConsoleConfig, LiveConsole};
pub use error::{Error, Result};
pub use focused::FocusedView;
pub use grid::{
    FleetSummary, GridOrchestrator, GridViewState, LayoutMode, PageView, Slot, StatusFilter,
};
pub use playback::{
    PlaybackConfig, PlaybackEnvironment, PlaybackState, SessionHandle, SessionObserver,
    SessionSnapshot, SurfaceOptions,
};
pub use registry::{SessionLease, SessionRegistry, SharingPolicy};
