//! Section navigator: turns a click on a navigation entry into a scroll
//! request.

use serde::{Deserialize, Serialize};

use super::menu::MenuToggle;
use super::section::{SectionId, SectionLookup};

/// How the client should scroll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollBehavior {
    /// Animated scroll, easing left to the browser.
    #[default]
    Smooth,
    /// Jump without animation.
    Instant,
}

/// Fire-and-forget instruction to bring a section into view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollRequest {
    /// Section to scroll to.
    pub section: SectionId,
    /// Scroll animation.
    pub behavior: ScrollBehavior,
}

/// Resolves navigation targets against the mounted sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionNavigator {
    behavior: ScrollBehavior,
}

impl SectionNavigator {
    /// Creates a navigator that requests smooth scrolling.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            behavior: ScrollBehavior::Smooth,
        }
    }

    /// Creates a navigator with an explicit scroll behavior.
    #[must_use]
    pub const fn with_behavior(behavior: ScrollBehavior) -> Self {
        Self { behavior }
    }

    /// Navigates to `target`.
    ///
    /// The menu is closed in every case. Returns a scroll request when the
    /// target is mounted in `layout`, and `None` otherwise.
    pub fn navigate(
        &self,
        target: &str,
        layout: &impl SectionLookup,
        menu: &mut MenuToggle,
    ) -> Option<ScrollRequest> {
        menu.close();
        if layout.bounds(target).is_none() {
            tracing::debug!(target, "navigation target not mounted");
            return None;
        }
        Some(ScrollRequest {
            section: SectionId::new(target),
            behavior: self.behavior,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::section::{DocumentLayout, SectionBounds};

    fn layout() -> DocumentLayout {
        let mut layout = DocumentLayout::new();
        layout.insert("hero", SectionBounds::new(0.0, 800.0).unwrap());
        layout.insert("projects", SectionBounds::new(800.0, 900.0).unwrap());
        layout
    }

    #[test]
    fn test_navigate_to_mounted_section() {
        let mut menu = MenuToggle::new();
        let request = SectionNavigator::new()
            .navigate("projects", &layout(), &mut menu)
            .unwrap();
        assert_eq!(request.section, "projects");
        assert_eq!(request.behavior, ScrollBehavior::Smooth);
    }

    #[test]
    fn test_navigate_closes_open_menu() {
        let mut menu = MenuToggle::new();
        menu.toggle();
        let request = SectionNavigator::new().navigate("hero", &layout(), &mut menu);
        assert!(request.is_some());
        assert!(!menu.is_open());
    }

    #[test]
    fn test_missing_target_is_noop_and_closes_menu() {
        let mut menu = MenuToggle::new();
        menu.toggle();
        let request = SectionNavigator::new().navigate("blog", &layout(), &mut menu);
        assert!(request.is_none());
        assert!(!menu.is_open());
    }

    #[test]
    fn test_instant_behavior() {
        let mut menu = MenuToggle::new();
        let request = SectionNavigator::with_behavior(ScrollBehavior::Instant)
            .navigate("hero", &layout(), &mut menu)
            .unwrap();
        assert_eq!(request.behavior, ScrollBehavior::Instant);
    }

    #[test]
    fn test_scroll_request_wire_shape() {
        let request = ScrollRequest {
            section: SectionId::new("about"),
            behavior: ScrollBehavior::Smooth,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["section"], "about");
        assert_eq!(json["behavior"], "smooth");
    }
}
