//! View filters and the fleet summary shown alongside them

use serde::{Deserialize, Serialize};

use super::layout::LayoutMode;
use crate::camera::CameraDescriptor;

/// Connection status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Online,
    Offline,
}

impl StatusFilter {
    pub fn matches(self, camera: &CameraDescriptor) -> bool {
        match self {
            StatusFilter::Online => camera.online,
            StatusFilter::Offline => !camera.online,
        }
    }
}

/// Grid view settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridViewState {
    pub layout_mode: LayoutMode,
    /// 1-based
    pub current_page: usize,
    pub status_filter: Option<StatusFilter>,
    /// Exact location name
    pub location_filter: Option<String>,
}

impl GridViewState {
    /// Whether `camera` passes both filters
    pub fn matches(&self, camera: &CameraDescriptor) -> bool {
        if let Some(status) = self.status_filter {
            if !status.matches(camera) {
                return false;
            }
        }

        match &self.location_filter {
            Some(location) => camera.location_name == *location,
            None => true,
        }
    }
}

impl Default for GridViewState {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::Auto,
            current_page: 1,
            status_filter: None,
            location_filter: None,
        }
    }
}

/// Counts for the filter bar, over the whole fleet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetSummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    /// Distinct location names, sorted
    pub locations: Vec<String>,
}

impl FleetSummary {
    pub fn from_cameras(cameras: &[CameraDescriptor]) -> Self {
        let online = cameras.iter().filter(|c| c.online).count();

        let mut locations: Vec<String> = cameras
            .iter()
            .filter(|c| !c.location_name.is_empty())
            .map(|c| c.location_name.clone())
            .collect();
        locations.sort();
        locations.dedup();

        Self {
            total: cameras.len(),
            online,
            offline: cameras.len() - online,
            locations,
        }
    }
}
