//! Session registry
//!
//! The registry maps each camera to at most one running playback session and
//! hands out leases to the views displaying it. A session lives while at least
//! one lease is held; releasing the last lease tears it down.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<SessionRegistry>
//!                 ┌─────────────────────────────┐
//!                 │ sessions: HashMap<CameraId, │
//!                 │   SessionEntry {            │
//!                 │     handle: SessionHandle,  │
//!                 │     leases: {id → options}, │
//!                 │   }                         │
//!                 │ >                           │
//!                 └──────────────┬──────────────┘
//!                                │
//!             ┌──────────────────┴──────────────────┐
//!             ▼                                     ▼
//!      [GridOrchestrator]                     [FocusedView]
//!      acquire() / release()                  acquire() / release()
//! ```
//!
//! When several leases share a session, the surface options are merged so
//! that audio is unmuted and controls shown if any viewer asks for it.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{SessionEntry, SessionInfo};
pub use error::RegistryError;
pub use store::{SessionLease, SessionRegistry};

/// How the grid and the focused view obtain sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SharingPolicy {
    /// Grid and focused view use separate registries; a camera shown in both
    /// runs two decoders
    #[default]
    Independent,
    /// Both views lease from one registry; one decoder per camera
    Shared,
}
