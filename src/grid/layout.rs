//! Grid layouts
//!
//! A layout fixes how many slots one page of the grid holds.

use serde::{Deserialize, Serialize};

/// Slot arrangement of the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutMode {
    /// Pick the grid size from the number of filtered cameras
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "2x2")]
    Fixed2x2,
    #[serde(rename = "3x3")]
    Fixed3x3,
    #[serde(rename = "4x4")]
    Fixed4x4,
}

impl LayoutMode {
    /// Cameras per row (and per column) for `filtered` cameras
    ///
    /// `Auto` switches to 3x3 at five cameras and to 4x4 at ten, so a
    /// twelve-camera wall fits on one 4x4 page.
    pub fn side(self, filtered: usize) -> usize {
        match self {
            LayoutMode::Auto => match filtered {
                0..=4 => 2,
                5..=9 => 3,
                _ => 4,
            },
            LayoutMode::Fixed2x2 => 2,
            LayoutMode::Fixed3x3 => 3,
            LayoutMode::Fixed4x4 => 4,
        }
    }

    /// Slots per page for `filtered` cameras
    pub fn items_per_page(self, filtered: usize) -> usize {
        let side = self.side(filtered);
        side * side
    }
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutMode::Auto => write!(f, "auto"),
            LayoutMode::Fixed2x2 => write!(f, "2x2"),
            LayoutMode::Fixed3x3 => write!(f, "3x3"),
            LayoutMode::Fixed4x4 => write!(f, "4x4"),
        }
    }
}

/// Number of pages needed for `filtered` cameras
pub fn total_pages(filtered: usize, items_per_page: usize) -> usize {
    if items_per_page == 0 {
        return 0;
    }
    filtered.div_ceil(items_per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_thresholds() {
        assert_eq!(LayoutMode::Auto.items_per_page(0), 4);
        assert_eq!(LayoutMode::Auto.items_per_page(4), 4);
        assert_eq!(LayoutMode::Auto.items_per_page(5), 9);
        assert_eq!(LayoutMode::Auto.items_per_page(9), 9);
        assert_eq!(LayoutMode::Auto.items_per_page(200), 16);
    }

    #[test]
    fn test_auto_boundary_at_ten() {
        assert_eq!(LayoutMode::Auto.items_per_page(9), 9);
        assert_eq!(total_pages(9, LayoutMode::Auto.items_per_page(9)), 1);

        assert_eq!(LayoutMode::Auto.items_per_page(10), 16);
        assert_eq!(total_pages(10, LayoutMode::Auto.items_per_page(10)), 1);

        assert_eq!(LayoutMode::Auto.items_per_page(12), 16);
        assert_eq!(total_pages(12, LayoutMode::Auto.items_per_page(12)), 1);
    }

    #[test]
    fn test_fixed_ignores_count() {
        for count in [0, 3, 12, 40] {
            assert_eq!(LayoutMode::Fixed2x2.items_per_page(count), 4);
            assert_eq!(LayoutMode::Fixed3x3.items_per_page(count), 9);
            assert_eq!(LayoutMode::Fixed4x4.items_per_page(count), 16);
        }
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 4), 0);
        assert_eq!(total_pages(12, 9), 2);
        assert_eq!(total_pages(16, 4), 4);
        assert_eq!(total_pages(17, 4), 5);
    }

    #[test]
    fn test_serde_names() {
        let mode: LayoutMode = serde_json::from_str("\"3x3\"").unwrap();
        assert_eq!(mode, LayoutMode::Fixed3x3);
        assert_eq!(serde_json::to_string(&LayoutMode::Auto).unwrap(), "\"auto\"");
        assert_eq!(LayoutMode::Fixed4x4.to_string(), "4x4");
    }
}
