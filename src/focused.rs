//! Focused view
//!
//! A single full-screen session with audio and user controls, opened on
//! demand next to the grid. Closing it leaves the camera's grid session
//! alone.

use std::sync::Arc;

use tokio::sync::watch;

use crate::camera::CameraDescriptor;
use crate::error::{Error, Result};
use crate::playback::{SessionSnapshot, SurfaceOptions};
use crate::registry::{SessionLease, SessionRegistry};

/// Controller for the full-screen viewer
///
/// Call [`close`](Self::close) when the viewer goes away. Dropping an open
/// view releases its session on a background task.
pub struct FocusedView {
    registry: Arc<SessionRegistry>,
    current: Option<(CameraDescriptor, SessionLease)>,
}

impl FocusedView {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// Camera currently open
    pub fn camera(&self) -> Option<&CameraDescriptor> {
        self.current.as_ref().map(|(camera, _)| camera)
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Open `camera`, closing whatever was open before
    ///
    /// Reopening the camera already shown only applies the descriptor.
    pub async fn open(&mut self, camera: CameraDescriptor) {
        if self.camera().is_some_and(|c| c.id == camera.id) {
            self.update_camera(&camera).await;
            return;
        }

        self.close().await;

        let lease = self.registry.acquire(&camera, SurfaceOptions::focused()).await;
        tracing::info!(camera = %camera.id, "Focused view opened");
        self.current = Some((camera, lease));
    }

    /// Close the view and release its session
    pub async fn close(&mut self) {
        if let Some((camera, lease)) = self.current.take() {
            self.registry.release(lease).await;
            tracing::info!(camera = %camera.id, "Focused view closed");
        }
    }

    /// Manual retry of the focused session
    pub async fn retry(&self) -> Result<()> {
        let (camera, _) = self.current.as_ref().ok_or(Error::NothingFocused)?;
        self.registry.retry(&camera.id).await?;
        Ok(())
    }

    /// Snapshot of the focused session
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let camera = self.camera()?;
        self.registry.snapshot(&camera.id).await
    }

    /// Receiver for the focused session's snapshots
    pub async fn subscribe(&self) -> Option<watch::Receiver<SessionSnapshot>> {
        let camera = self.camera()?;
        self.registry.subscribe(&camera.id).await
    }

    /// Apply a refreshed descriptor if it is the focused camera
    pub async fn update_camera(&mut self, camera: &CameraDescriptor) {
        let Some((current, _)) = self.current.as_mut() else {
            return;
        };
        if current.id != camera.id {
            return;
        }

        *current = camera.clone();
        self.registry.update_endpoint(camera).await;
    }
}

impl std::fmt::Debug for FocusedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusedView")
            .field("camera", &self.camera().map(|c| &c.id))
            .finish()
    }
}

impl Drop for FocusedView {
    fn drop(&mut self) {
        if let Some((_, lease)) = self.current.take() {
            self.registry.release_detached(vec![lease]);
        }
    }
}
