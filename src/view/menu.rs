//! Mobile menu visibility.

/// Open/closed flag of the collapsible navigation menu.
///
/// Starts closed. Changed only by [`MenuToggle::toggle`] or forced closed by
/// navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuToggle {
    open: bool,
}

impl MenuToggle {
    /// Creates a closed menu.
    #[must_use]
    pub const fn new() -> Self {
        Self { open: false }
    }

    /// Flips the flag and returns the new value.
    pub const fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Forces the menu closed. Returns `true` if it was open.
    pub const fn close(&mut self) -> bool {
        let was_open = self.open;
        self.open = false;
        was_open
    }

    /// Whether the menu is shown.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }
}
