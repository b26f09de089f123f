//! Section identifiers and document geometry.
//!
//! The client reports where each section sits in the document; the scroll
//! spy and the navigator read that geometry through [`SectionLookup`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical section order used when the site file does not override it.
pub const DEFAULT_SECTIONS: [&str; 5] = ["hero", "about", "skills", "projects", "contact"];

/// Pixels added to the scroll offset before matching a section, so that a
/// section becomes active slightly before its top edge reaches the viewport.
pub const DEFAULT_SCROLL_BIAS: f64 = 100.0;

/// Identifier of a page section (e.g. `"about"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Creates a section id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for SectionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SectionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Returns the canonical section order as owned ids.
#[must_use]
pub fn default_order() -> Vec<SectionId> {
    DEFAULT_SECTIONS.iter().copied().map(SectionId::from).collect()
}

/// Vertical extent of a mounted section: the half-open interval
/// `[top, top + height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionBounds {
    top: f64,
    height: f64,
}

impl SectionBounds {
    /// Creates bounds, rejecting negative or non-finite values.
    #[must_use]
    pub fn new(top: f64, height: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        (valid(top) && valid(height)).then_some(Self { top, height })
    }

    /// Offset of the section's top edge from the document top.
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.top
    }

    /// Height of the section.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Returns `true` if `position` falls inside `[top, top + height)`.
    #[must_use]
    pub fn contains(&self, position: f64) -> bool {
        self.top <= position && position < self.bottom()
    }
}

/// One entry of a client layout report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionGeometry {
    /// Section id as written in the page markup.
    pub id: String,
    /// Offset of the section's top edge.
    pub top: f64,
    /// Section height.
    pub height: f64,
}

/// Read access to section geometry.
///
/// A lookup that returns `None` means the section is not mounted.
pub trait SectionLookup {
    /// Returns the bounds of the section, if mounted.
    fn bounds(&self, id: &str) -> Option<SectionBounds>;
}

/// The most recent geometry reported by the client.
#[derive(Debug, Clone, Default)]
pub struct DocumentLayout {
    sections: HashMap<String, SectionBounds>,
}

impl DocumentLayout {
    /// Creates an empty layout (no section mounted).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a layout from a client report.
    ///
    /// Entries with negative or non-finite geometry are dropped and behave
    /// as unmounted sections.
    #[must_use]
    pub fn from_geometry(entries: &[SectionGeometry]) -> Self {
        let mut layout = Self::new();
        for entry in entries {
            match SectionBounds::new(entry.top, entry.height) {
                Some(bounds) => {
                    layout.sections.insert(entry.id.clone(), bounds);
                }
                None => {
                    tracing::debug!(section = %entry.id, "dropping invalid section geometry");
                }
            }
        }
        layout
    }

    /// Records bounds for a section, replacing previous ones.
    pub fn insert(&mut self, id: impl Into<String>, bounds: SectionBounds) {
        self.sections.insert(id.into(), bounds);
    }

    /// Number of mounted sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if no section is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Bottom edge of the lowest mounted section.
    #[must_use]
    pub fn document_height(&self) -> f64 {
        self.sections
            .values()
            .map(SectionBounds::bottom)
            .fold(0.0, f64::max)
    }
}

impl SectionLookup for DocumentLayout {
    fn bounds(&self, id: &str) -> Option<SectionBounds> {
        self.sections.get(id).copied()
    }
}
