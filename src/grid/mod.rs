//! Grid of camera previews
//!
//! The grid filters the fleet, cuts it into pages sized by the layout and
//! holds one muted session per camera on the visible page. Changing a filter
//! or the layout goes back to the first page; placeholders pad the last page
//! and never get a session.

pub mod filter;
pub mod layout;
pub mod orchestrator;
pub mod page;

pub use filter::{FleetSummary, GridViewState, StatusFilter};
pub use layout::{total_pages, LayoutMode};
pub use orchestrator::GridOrchestrator;
pub use page::{compute_page, PageView, Slot};
