//! Crate error types
//!
//! Playback failures never surface here: a session resolves them into its
//! `Error` state. These errors cover inventory loading and misuse of handles.

use thiserror::Error;

use crate::camera::CameraId;
use crate::registry::RegistryError;

/// Error type for console operations
#[derive(Debug, Error)]
pub enum Error {
    /// The inventory document is inconsistent
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Inventory document could not be parsed
    #[error("Invalid inventory document: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading an inventory file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The session task has already shut down
    #[error("Session closed: {0}")]
    SessionClosed(CameraId),

    /// The camera is not in the current inventory
    #[error("Unknown camera: {0}")]
    UnknownCamera(CameraId),

    /// The focused view has no camera open
    #[error("No camera is open in the focused view")]
    NothingFocused,

    /// Registry lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
