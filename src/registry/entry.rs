//! Session entry types
//!
//! Per-camera state stored in the registry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use url::Url;

use crate::camera::CameraId;
use crate::playback::{SessionHandle, SessionSnapshot, SurfaceOptions};

/// Entry for a single camera's session
pub struct SessionEntry {
    /// Running session
    pub(super) handle: SessionHandle,

    /// Endpoint the session was last pointed at
    pub endpoint: Option<Url>,

    /// Surface options requested by each outstanding lease
    pub(super) leases: HashMap<u64, SurfaceOptions>,

    /// Options currently applied to the surface
    pub applied: SurfaceOptions,

    /// When the session was created
    pub created_at: Instant,
}

impl SessionEntry {
    pub(super) fn new(
        handle: SessionHandle,
        endpoint: Option<Url>,
        options: SurfaceOptions,
    ) -> Self {
        Self {
            handle,
            endpoint,
            leases: HashMap::new(),
            applied: options,
            created_at: Instant::now(),
        }
    }

    /// Number of outstanding leases
    pub fn lease_count(&self) -> usize {
        self.leases.len()
    }

    /// Options satisfying every outstanding lease
    pub fn merged_options(&self) -> Option<SurfaceOptions> {
        self.leases.values().copied().reduce(SurfaceOptions::merge)
    }

    /// Reconfigure the surface if the merged options changed
    ///
    /// Returns `false` if the session task has stopped.
    pub(super) fn apply_options(&mut self) -> bool {
        let Some(merged) = self.merged_options() else {
            return true;
        };
        if merged == self.applied {
            return true;
        }

        self.applied = merged;
        self.handle.configure(merged).is_ok()
    }

    /// Point the session at a new endpoint if it changed
    pub(super) fn update_endpoint(&mut self, endpoint: Option<&Url>) -> bool {
        if self.endpoint.as_ref() == endpoint {
            return true;
        }

        self.endpoint = endpoint.cloned();
        self.handle.set_endpoint(self.endpoint.clone()).is_ok()
    }

    /// Latest snapshot of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        self.handle.snapshot()
    }
}

/// Registry view of one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub camera_id: CameraId,
    /// Number of views holding the session
    pub leases: usize,
    /// Options applied to the surface
    pub options: SurfaceOptions,
    /// Time since the session was created
    #[serde(serialize_with = "serialize_millis")]
    pub age: Duration,
    pub snapshot: SessionSnapshot,
}

fn serialize_millis<S: serde::Serializer>(age: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(age.as_millis() as u64)
}
