//! Registry error types

use thiserror::Error;

use crate::camera::CameraId;

/// Error type for registry operations
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// No session is registered for the camera
    #[error("Session not found: {0}")]
    SessionNotFound(CameraId),

    /// The session task stopped without being released
    #[error("Session closed: {0}")]
    SessionClosed(CameraId),
}
