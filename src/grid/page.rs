//! Page computation
//!
//! Pure function from camera list and view settings to the visible page.

use serde::Serialize;

use super::filter::GridViewState;
use super::layout::total_pages;
use crate::camera::CameraDescriptor;

/// One grid position
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "camera", rename_all = "snake_case")]
pub enum Slot {
    /// Hosts the camera's session
    Camera(CameraDescriptor),
    /// Fills the rest of the last page; never has a session
    Placeholder,
}

impl Slot {
    pub fn camera(&self) -> Option<&CameraDescriptor> {
        match self {
            Slot::Camera(camera) => Some(camera),
            Slot::Placeholder => None,
        }
    }
}

/// The visible page of the grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    /// 1-based page shown
    pub page: usize,
    pub total_pages: usize,
    pub items_per_page: usize,
    /// Cameras passing the filters, across all pages
    pub filtered_count: usize,
    /// Exactly `items_per_page` slots, or none when nothing matches
    pub slots: Vec<Slot>,
}

impl PageView {
    /// Nothing matches the filters
    pub fn is_empty(&self) -> bool {
        self.filtered_count == 0
    }

    /// Cameras on this page, in slot order
    pub fn cameras(&self) -> impl Iterator<Item = &CameraDescriptor> {
        self.slots.iter().filter_map(Slot::camera)
    }

    pub fn placeholder_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Placeholder))
            .count()
    }
}

/// Clamp a 1-based page into `1..=max(total_pages, 1)`
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Compute the page `state` selects out of `cameras`
///
/// The requested page is clamped to the available range.
pub fn compute_page(cameras: &[CameraDescriptor], state: &GridViewState) -> PageView {
    let filtered: Vec<&CameraDescriptor> = cameras.iter().filter(|c| state.matches(c)).collect();

    let items_per_page = state.layout_mode.items_per_page(filtered.len());
    let total_pages = total_pages(filtered.len(), items_per_page);
    let page = clamp_page(state.current_page, total_pages);

    if filtered.is_empty() {
        return PageView {
            page,
            total_pages,
            items_per_page,
            filtered_count: 0,
            slots: Vec::new(),
        };
    }

    let mut slots: Vec<Slot> = filtered
        .iter()
        .skip((page - 1) * items_per_page)
        .take(items_per_page)
        .map(|c| Slot::Camera((*c).clone()))
        .collect();
    slots.resize(items_per_page, Slot::Placeholder);

    PageView {
        page,
        total_pages,
        items_per_page,
        filtered_count: filtered.len(),
        slots,
    }
}
