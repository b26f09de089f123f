//! Scroll spy: maps a scroll offset onto the active section.

use super::section::{DEFAULT_SCROLL_BIAS, SectionId, SectionLookup, default_order};

/// Tracks which section is currently active.
///
/// Exactly one section is active at all times. Before the first scroll the
/// first section of the order is active; when no section contains the biased
/// offset, the previous answer is kept.
#[derive(Debug, Clone)]
pub struct ScrollSpy {
    order: Vec<SectionId>,
    bias: f64,
    active: usize,
    last_offset: f64,
}

impl ScrollSpy {
    /// Creates a scroll spy for the given section order.
    ///
    /// An empty order falls back to the canonical sections and a negative
    /// or non-finite bias falls back to [`DEFAULT_SCROLL_BIAS`].
    #[must_use]
    pub fn new(order: Vec<SectionId>, bias: f64) -> Self {
        let order = if order.is_empty() {
            default_order()
        } else {
            order
        };
        let bias = if bias.is_finite() && bias >= 0.0 {
            bias
        } else {
            DEFAULT_SCROLL_BIAS
        };
        Self {
            order,
            bias,
            active: 0,
            last_offset: 0.0,
        }
    }

    /// Returns the active section.
    #[must_use]
    pub fn active(&self) -> &SectionId {
        &self.order[self.active]
    }

    /// Returns the configured section order.
    #[must_use]
    pub fn order(&self) -> &[SectionId] {
        &self.order
    }

    /// Returns the bias in pixels.
    #[must_use]
    pub const fn bias(&self) -> f64 {
        self.bias
    }

    /// Returns `true` if `id` is one of the configured sections.
    #[must_use]
    pub fn knows(&self, id: &str) -> bool {
        self.order.iter().any(|s| s == id)
    }

    /// Recomputes the active section for a new scroll offset.
    ///
    /// Negative offsets are clamped to zero. Non-finite offsets are ignored.
    /// Sections missing from `layout` are skipped; the first section in
    /// order whose interval contains `offset + bias` wins.
    pub fn update(&mut self, offset: f64, layout: &impl SectionLookup) -> &SectionId {
        if !offset.is_finite() {
            tracing::trace!(offset, "ignoring non-finite scroll offset");
            return self.active();
        }
        self.last_offset = offset.max(0.0);
        self.recompute(layout)
    }

    /// Recomputes at the last known offset (used when the layout changes).
    pub fn refresh(&mut self, layout: &impl SectionLookup) -> &SectionId {
        self.recompute(layout)
    }

    fn recompute(&mut self, layout: &impl SectionLookup) -> &SectionId {
        let position = self.last_offset + self.bias;
        let hit = self.order.iter().position(|id| {
            layout
                .bounds(id.as_str())
                .is_some_and(|bounds| bounds.contains(position))
        });
        if let Some(index) = hit {
            self.active = index;
        }
        self.active()
    }
}

impl Default for ScrollSpy {
    fn default() -> Self {
        Self::new(default_order(), DEFAULT_SCROLL_BIAS)
    }
}
