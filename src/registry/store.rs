//! Session registry implementation
//!
//! Owns every running session of one view (or of both views when they
//! share) and enforces a single session per camera.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use super::entry::{SessionEntry, SessionInfo};
use super::error::RegistryError;
use crate::camera::{CameraDescriptor, CameraId};
use crate::playback::{SessionContext, SessionHandle, SessionSnapshot, SurfaceOptions};

/// A view's claim on a camera's session
///
/// Hand the lease back through [`SessionRegistry::release`]; the session
/// keeps running until every lease on it is released.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a lease keeps its session alive until released"]
pub struct SessionLease {
    id: u64,
    camera_id: CameraId,
}

impl SessionLease {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn camera_id(&self) -> &CameraId {
        &self.camera_id
    }
}

/// Registry of running playback sessions
///
/// Thread-safe via `RwLock`. Snapshot and lookup calls take the read lock;
/// acquire and release take the write lock.
pub struct SessionRegistry {
    /// Map of camera to session entry
    sessions: RwLock<HashMap<CameraId, SessionEntry>>,

    /// Collaborators handed to new sessions
    ctx: SessionContext,

    next_lease_id: AtomicU64,
}

impl SessionRegistry {
    /// Create an empty registry spawning sessions with `ctx`
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ctx,
            next_lease_id: AtomicU64::new(1),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Lease the session for `camera`, creating it if needed
    ///
    /// An existing session is reused: its endpoint is brought up to date and
    /// its surface options are merged with `options`.
    pub async fn acquire(
        &self,
        camera: &CameraDescriptor,
        options: SurfaceOptions,
    ) -> SessionLease {
        let lease_id = self.next_lease_id.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.write().await;

        // A session whose task died is replaced rather than shared
        if sessions.get(&camera.id).is_some_and(|e| e.handle.is_closed()) {
            if let Some(stale) = sessions.remove(&camera.id) {
                tracing::warn!(camera = %camera.id, "Replacing closed session");
                stale.handle.destroy().await;
            }
        }

        if let Some(entry) = sessions.get_mut(&camera.id) {
            entry.leases.insert(lease_id, options);
            entry.update_endpoint(camera.stream_endpoint.as_ref());
            entry.apply_options();

            tracing::info!(
                camera = %camera.id,
                lease = lease_id,
                leases = entry.lease_count(),
                "Session lease added (existing session)"
            );
        } else {
            let handle = SessionHandle::spawn(camera, options, self.ctx.clone());
            let mut entry = SessionEntry::new(handle, camera.stream_endpoint.clone(), options);
            entry.leases.insert(lease_id, options);
            sessions.insert(camera.id.clone(), entry);

            tracing::info!(
                camera = %camera.id,
                lease = lease_id,
                "Session lease added (new session)"
            );
        }

        SessionLease {
            id: lease_id,
            camera_id: camera.id.clone(),
        }
    }

    /// Give back a lease
    ///
    /// Releasing the last lease destroys the session and waits for its
    /// teardown. Otherwise the surface options are recomputed from the
    /// remaining leases.
    pub async fn release(&self, lease: SessionLease) {
        let mut sessions = self.sessions.write().await;

        let Some(entry) = sessions.get_mut(&lease.camera_id) else {
            tracing::debug!(
                camera = %lease.camera_id,
                lease = lease.id,
                "Release for unknown session"
            );
            return;
        };

        if entry.leases.remove(&lease.id).is_none() {
            tracing::warn!(camera = %lease.camera_id, lease = lease.id, "Lease release mismatch");
            return;
        }

        if !entry.leases.is_empty() {
            entry.apply_options();
            tracing::info!(
                camera = %lease.camera_id,
                lease = lease.id,
                leases = entry.lease_count(),
                "Session lease released"
            );
            return;
        }

        if let Some(entry) = sessions.remove(&lease.camera_id) {
            entry.handle.destroy().await;
            tracing::info!(camera = %lease.camera_id, lease = lease.id, "Session destroyed");
        }
    }

    /// Release `leases` without awaiting, for use from `Drop`
    ///
    /// The releases run on a spawned task. Outside a runtime the leases stay
    /// held until [`shutdown`](Self::shutdown).
    pub fn release_detached(self: &Arc<Self>, leases: Vec<SessionLease>) {
        if leases.is_empty() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let registry = Arc::clone(self);
                runtime.spawn(async move {
                    for lease in leases {
                        registry.release(lease).await;
                    }
                });
            }
            Err(_) => {
                tracing::warn!(leases = leases.len(), "No runtime to release dropped leases");
            }
        }
    }

    /// Apply a refreshed descriptor to the camera's session, if any
    pub async fn update_endpoint(&self, camera: &CameraDescriptor) {
        let mut sessions = self.sessions.write().await;

        if let Some(entry) = sessions.get_mut(&camera.id) {
            if !entry.update_endpoint(camera.stream_endpoint.as_ref()) {
                tracing::warn!(camera = %camera.id, "Endpoint update for closed session");
            }
        }
    }

    /// Request a manual retry of the camera's session
    pub async fn retry(&self, camera_id: &CameraId) -> Result<(), RegistryError> {
        let sessions = self.sessions.read().await;

        let entry = sessions
            .get(camera_id)
            .ok_or_else(|| RegistryError::SessionNotFound(camera_id.clone()))?;

        entry
            .handle
            .retry()
            .map_err(|_| RegistryError::SessionClosed(camera_id.clone()))
    }

    /// Latest snapshot of the camera's session
    pub async fn snapshot(&self, camera_id: &CameraId) -> Option<SessionSnapshot> {
        let sessions = self.sessions.read().await;
        sessions.get(camera_id).map(|e| e.snapshot())
    }

    /// Snapshots of every session, ordered by camera
    pub async fn snapshots(&self) -> Vec<SessionSnapshot> {
        let sessions = self.sessions.read().await;
        let mut snapshots: Vec<SessionSnapshot> = sessions.values().map(|e| e.snapshot()).collect();
        snapshots.sort_by(|a, b| a.camera_id.cmp(&b.camera_id));
        snapshots
    }

    /// Receiver notified on every change of the camera's session
    pub async fn subscribe(
        &self,
        camera_id: &CameraId,
    ) -> Option<watch::Receiver<SessionSnapshot>> {
        let sessions = self.sessions.read().await;
        sessions.get(camera_id).map(|e| e.handle.subscribe())
    }

    /// Registry view of the camera's session
    pub async fn session_info(&self, camera_id: &CameraId) -> Option<SessionInfo> {
        let sessions = self.sessions.read().await;
        sessions.get(camera_id).map(|entry| SessionInfo {
            camera_id: camera_id.clone(),
            leases: entry.lease_count(),
            options: entry.applied,
            age: entry.created_at.elapsed(),
            snapshot: entry.snapshot(),
        })
    }

    /// Check if the camera has a session
    pub async fn contains(&self, camera_id: &CameraId) -> bool {
        self.sessions.read().await.contains_key(camera_id)
    }

    /// Get total number of sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Cameras with a session, sorted
    pub async fn active_cameras(&self) -> Vec<CameraId> {
        let sessions = self.sessions.read().await;
        let mut cameras: Vec<CameraId> = sessions.keys().cloned().collect();
        cameras.sort();
        cameras
    }

    /// Remove sessions whose task has stopped
    ///
    /// Their leases become stale; releasing them later is a no-op.
    pub async fn cleanup(&self) -> usize {
        let mut sessions = self.sessions.write().await;

        let closed: Vec<CameraId> = sessions
            .iter()
            .filter(|(_, entry)| entry.handle.is_closed())
            .map(|(id, _)| id.clone())
            .collect();

        for camera in &closed {
            if let Some(entry) = sessions.remove(camera) {
                entry.handle.destroy().await;
                tracing::info!(camera = %camera, "Closed session removed by cleanup");
            }
        }

        closed.len()
    }

    /// Destroy every session regardless of outstanding leases
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();

        for (_, entry) in sessions.drain() {
            entry.handle.destroy().await;
        }

        if count > 0 {
            tracing::info!(sessions = count, "Registry shut down");
        }
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::assert_ok;
    use url::Url;

    use super::*;
    use crate::playback::{DecoderEvent, PlaybackState};
    use crate::testing::{camera, init_tracing, ClientCall, FakeEnvironment};

    fn registry(env: &FakeEnvironment) -> SessionRegistry {
        SessionRegistry::new(env.context())
    }

    #[tokio::test]
    async fn test_acquire_creates_session() {
        init_tracing();
        let env = FakeEnvironment::new();
        let registry = registry(&env);
        let cam = camera("cam-01", true);

        let lease = registry.acquire(&cam, SurfaceOptions::grid()).await;

        assert_eq!(lease.camera_id(), &cam.id);
        assert!(registry.contains(&cam.id).await);
        assert_eq!(registry.session_count().await, 1);
        assert_eq!(env.clients_created("cam-01"), 1);

        let snapshot = registry.snapshot(&cam.id).await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Loading);
        assert!(snapshot.muted);
    }

    #[tokio::test]
    async fn test_shared_session_merges_options() {
        let env = FakeEnvironment::new();
        let registry = registry(&env);
        let cam = camera("cam-01", true);

        let grid = registry.acquire(&cam, SurfaceOptions::grid()).await;
        let focused = registry.acquire(&cam, SurfaceOptions::focused()).await;
        assert_ne!(grid.id(), focused.id());

        // Still one decoder for the camera
        assert_eq!(env.clients_created("cam-01"), 1);
        assert_eq!(registry.session_count().await, 1);

        let info = registry.session_info(&cam.id).await.unwrap();
        assert_eq!(info.leases, 2);
        assert!(!info.options.muted);
        assert!(info.options.controls);

        let mut rx = registry.subscribe(&cam.id).await.unwrap();
        rx.wait_for(|s| !s.muted).await.unwrap();
        assert!(env.surface("cam-01").options.controls);

        // Dropping back to the grid lease mutes again
        registry.release(focused).await;
        rx.wait_for(|s| s.muted).await.unwrap();
        assert_eq!(env.surface("cam-01").options, SurfaceOptions::grid());
        assert_eq!(env.live_clients(), 1);

        registry.release(grid).await;
        assert!(!registry.contains(&cam.id).await);
        assert_eq!(env.live_clients(), 0);
    }

    #[tokio::test]
    async fn test_release_last_lease_destroys() {
        let env = FakeEnvironment::new();
        let registry = registry(&env);
        let cam = camera("cam-01", true);

        let lease = registry.acquire(&cam, SurfaceOptions::grid()).await;
        registry.release(lease).await;

        assert_eq!(registry.session_count().await, 0);
        assert_eq!(env.count_calls("cam-01", &ClientCall::Destroy), 1);
        assert!(env.surface("cam-01").released);
    }

    #[tokio::test]
    async fn test_release_detached() {
        let env = FakeEnvironment::new();
        let registry = Arc::new(registry(&env));

        let first = registry.acquire(&camera("cam-01", true), SurfaceOptions::grid()).await;
        let second = registry.acquire(&camera("cam-02", true), SurfaceOptions::grid()).await;
        let kept = registry.acquire(&camera("cam-02", true), SurfaceOptions::focused()).await;

        registry.release_detached(vec![first, second]);

        let cam_02 = CameraId::new("cam-02");
        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                let shared = registry.session_info(&cam_02).await.map(|info| info.leases);
                if registry.session_count().await == 1 && shared == Some(1) {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert_ok!(drained);

        assert_eq!(env.count_calls("cam-01", &ClientCall::Destroy), 1);
        let info = registry.session_info(&cam_02).await.unwrap();
        assert_eq!(info.options, SurfaceOptions::focused());

        registry.release(kept).await;
        assert_eq!(registry.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_release_after_shutdown_is_ignored() {
        let env = FakeEnvironment::new();
        let registry = registry(&env);

        let first = registry.acquire(&camera("cam-01", true), SurfaceOptions::grid()).await;
        let second = registry.acquire(&camera("cam-02", false), SurfaceOptions::grid()).await;

        registry.shutdown().await;
        assert_eq!(registry.session_count().await, 0);
        assert_eq!(env.live_clients(), 0);

        registry.release(first).await;
        registry.release(second).await;
        assert_eq!(env.count_calls("cam-01", &ClientCall::Destroy), 1);
    }

    #[tokio::test]
    async fn test_update_endpoint() {
        let env = FakeEnvironment::new();
        let registry = registry(&env);
        let cam = camera("cam-01", false);

        let _lease = registry.acquire(&cam, SurfaceOptions::grid()).await;
        let mut rx = registry.subscribe(&cam.id).await.unwrap();
        assert_eq!(rx.borrow().state, PlaybackState::NoStream);

        let moved = cam
            .clone()
            .endpoint(Url::parse("http://nvr.test/moved/index.m3u8").unwrap());
        registry.update_endpoint(&moved).await;

        rx.wait_for(|s| s.state == PlaybackState::Loading)
            .await
            .unwrap();
        assert_eq!(env.clients_created("cam-01"), 1);

        // Same endpoint again is not a change
        registry.update_endpoint(&moved).await;
        env.emit("cam-01", DecoderEvent::ManifestParsed);
        rx.wait_for(|s| s.state == PlaybackState::Playing)
            .await
            .unwrap();
        assert_eq!(env.clients_created("cam-01"), 1);
    }

    #[tokio::test]
    async fn test_update_endpoint_unknown_camera() {
        let env = FakeEnvironment::new();
        let registry = registry(&env);

        registry.update_endpoint(&camera("cam-09", true)).await;

        assert_eq!(registry.session_count().await, 0);
        assert_eq!(env.clients_created("cam-09"), 0);
    }

    #[tokio::test]
    async fn test_retry() {
        let env = FakeEnvironment::new();
        let registry = registry(&env);
        let cam = camera("cam-01", true);

        let result = registry.retry(&cam.id).await;
        assert!(matches!(result, Err(RegistryError::SessionNotFound(_))));

        let _lease = registry.acquire(&cam, SurfaceOptions::grid()).await;
        assert_ok!(registry.retry(&cam.id).await);
    }

    #[tokio::test]
    async fn test_active_cameras_and_snapshots() {
        let env = FakeEnvironment::new();
        let registry = registry(&env);

        let mut leases = Vec::new();
        for id in ["cam-03", "cam-01", "cam-02"] {
            leases.push(registry.acquire(&camera(id, true), SurfaceOptions::grid()).await);
        }

        let cameras: Vec<String> = registry
            .active_cameras()
            .await
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(cameras, vec!["cam-01", "cam-02", "cam-03"]);

        let snapshots = registry.snapshots().await;
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].camera_id.as_str(), "cam-01");

        for lease in leases {
            registry.release(lease).await;
        }
        assert!(registry.active_cameras().await.is_empty());
        assert_eq!(registry.cleanup().await, 0);
    }
}
