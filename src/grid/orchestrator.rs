//! Grid orchestrator
//!
//! Owns the grid view settings and keeps the registry in step with the
//! visible page: every camera on the page holds one lease, no other camera
//! does.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::filter::{FleetSummary, GridViewState, StatusFilter};
use super::layout::LayoutMode;
use super::page::{compute_page, PageView};
use crate::camera::{CameraDescriptor, CameraId, CameraInventory};
use crate::error::Result;
use crate::playback::{SessionSnapshot, SurfaceOptions};
use crate::registry::{RegistryError, SessionLease, SessionRegistry};

/// Paginated wall of camera previews
///
/// Call [`shutdown`](Self::shutdown) when the wall closes. Dropping the grid
/// with sessions still leased releases them on a background task.
pub struct GridOrchestrator {
    registry: Arc<SessionRegistry>,
    state: GridViewState,
    cameras: Vec<CameraDescriptor>,
    page: PageView,
    /// Leases held for cameras on the current page
    leases: HashMap<CameraId, SessionLease>,
}

impl GridOrchestrator {
    /// Create an empty grid leasing sessions from `registry`
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        let state = GridViewState::default();
        let page = compute_page(&[], &state);

        Self {
            registry,
            state,
            cameras: Vec::new(),
            page,
            leases: HashMap::new(),
        }
    }

    pub fn state(&self) -> &GridViewState {
        &self.state
    }

    /// Currently visible page
    pub fn page(&self) -> &PageView {
        &self.page
    }

    pub fn cameras(&self) -> &[CameraDescriptor] {
        &self.cameras
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Fleet counts for the filter bar
    pub fn summary(&self) -> FleetSummary {
        FleetSummary::from_cameras(&self.cameras)
    }

    /// Number of sessions the grid holds
    pub fn session_count(&self) -> usize {
        self.leases.len()
    }

    /// Whether the grid holds a session for `camera_id`
    pub fn has_session(&self, camera_id: &CameraId) -> bool {
        self.leases.contains_key(camera_id)
    }

    /// Replace the camera list, keeping the current page when possible
    pub async fn set_cameras(&mut self, cameras: Vec<CameraDescriptor>) -> &PageView {
        tracing::debug!(cameras = cameras.len(), "Camera list updated");
        self.cameras = cameras;
        self.reconcile().await;
        &self.page
    }

    /// Reload the camera list from `inventory`
    ///
    /// On error the grid keeps its current cameras.
    pub async fn refresh<I: CameraInventory>(&mut self, inventory: &I) -> Result<&PageView> {
        let cameras = inventory.cameras().await?;
        Ok(self.set_cameras(cameras).await)
    }

    pub async fn set_status_filter(&mut self, filter: Option<StatusFilter>) -> &PageView {
        if self.state.status_filter != filter {
            self.state.status_filter = filter;
            self.state.current_page = 1;
            self.reconcile().await;
        }
        &self.page
    }

    pub async fn set_location_filter(&mut self, location: Option<String>) -> &PageView {
        if self.state.location_filter != location {
            self.state.location_filter = location;
            self.state.current_page = 1;
            self.reconcile().await;
        }
        &self.page
    }

    pub async fn set_layout_mode(&mut self, mode: LayoutMode) -> &PageView {
        if self.state.layout_mode != mode {
            self.state.layout_mode = mode;
            self.state.current_page = 1;
            self.reconcile().await;
        }
        &self.page
    }

    /// Show `page` (1-based), clamped to the available pages
    pub async fn set_page(&mut self, page: usize) -> &PageView {
        self.state.current_page = page;
        self.reconcile().await;
        &self.page
    }

    pub async fn next_page(&mut self) -> &PageView {
        self.set_page(self.state.current_page.saturating_add(1)).await
    }

    pub async fn previous_page(&mut self) -> &PageView {
        self.set_page(self.state.current_page.saturating_sub(1)).await
    }

    /// Manual retry of a visible camera's session
    pub async fn retry(&self, camera_id: &CameraId) -> Result<()> {
        if !self.has_session(camera_id) {
            return Err(RegistryError::SessionNotFound(camera_id.clone()).into());
        }
        self.registry.retry(camera_id).await?;
        Ok(())
    }

    /// Snapshot of a visible camera's session
    pub async fn snapshot(&self, camera_id: &CameraId) -> Option<SessionSnapshot> {
        if !self.has_session(camera_id) {
            return None;
        }
        self.registry.snapshot(camera_id).await
    }

    /// Snapshots of the visible sessions, in slot order
    pub async fn snapshots(&self) -> Vec<SessionSnapshot> {
        let mut snapshots = Vec::with_capacity(self.leases.len());
        for camera in self.page.cameras() {
            if let Some(snapshot) = self.registry.snapshot(&camera.id).await {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    /// Release every session the grid holds
    pub async fn shutdown(&mut self) {
        for (_, lease) in self.leases.drain() {
            self.registry.release(lease).await;
        }
        tracing::info!("Grid shut down");
    }

    /// Bring the registry in line with the visible page
    ///
    /// Leaving cameras are released before entering ones are acquired, so
    /// the grid never holds more than one page of sessions.
    async fn reconcile(&mut self) {
        self.page = compute_page(&self.cameras, &self.state);
        self.state.current_page = self.page.page;

        let visible: Vec<CameraDescriptor> = self.page.cameras().cloned().collect();
        let visible_ids: HashSet<&CameraId> = visible.iter().map(|c| &c.id).collect();

        let leaving: Vec<CameraId> = self
            .leases
            .keys()
            .filter(|id| !visible_ids.contains(id))
            .cloned()
            .collect();

        for camera_id in &leaving {
            if let Some(lease) = self.leases.remove(camera_id) {
                self.registry.release(lease).await;
            }
        }

        let mut entering = 0;
        for camera in &visible {
            if self.leases.contains_key(&camera.id) {
                self.registry.update_endpoint(camera).await;
            } else {
                let lease = self.registry.acquire(camera, SurfaceOptions::grid()).await;
                self.leases.insert(camera.id.clone(), lease);
                entering += 1;
            }
        }

        tracing::info!(
            page = self.page.page,
            total_pages = self.page.total_pages,
            layout = %self.state.layout_mode,
            released = leaving.len(),
            acquired = entering,
            sessions = self.leases.len(),
            "Grid reconciled"
        );
    }
}

impl Drop for GridOrchestrator {
    fn drop(&mut self) {
        let leases: Vec<SessionLease> = self.leases.drain().map(|(_, lease)| lease).collect();
        self.registry.release_detached(leases);
    }
}

impl std::fmt::Debug for GridOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridOrchestrator")
            .field("state", &self.state)
            .field("cameras", &self.cameras.len())
            .field("sessions", &self.leases.len())
            .finish()
    }
}
