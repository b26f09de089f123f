//! Per-page-view interaction state.
//!
//! A [`PageView`] owns everything interactive about one open page: the
//! scroll spy, the mobile menu, the navigator, the latest cursor position,
//! the registered listeners and the typewriter ticker. Events are applied
//! one at a time through [`PageView::apply`], which returns the resulting
//! [`ViewSnapshot`] and the list of observable changes.

pub mod listeners;
pub mod menu;
pub mod navigator;
pub mod scroll_spy;
pub mod section;
pub mod ticker;
pub mod typewriter;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::SiteConfig;

pub use listeners::{ListenerKind, Listeners};
pub use menu::MenuToggle;
pub use navigator::{ScrollBehavior, ScrollRequest, SectionNavigator};
pub use scroll_spy::ScrollSpy;
pub use section::{
    DEFAULT_SCROLL_BIAS, DEFAULT_SECTIONS, DocumentLayout, SectionBounds, SectionGeometry,
    SectionId, SectionLookup,
};
pub use ticker::TypewriterTicker;
pub use typewriter::{Frame, Phase, Typewriter, TypewriterTimings};

// ============================================================================
// Options
// ============================================================================

/// Settings a page view is created with.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// Section order for the scroll spy.
    pub sections: Vec<SectionId>,
    /// Scroll spy bias in pixels.
    pub scroll_bias: f64,
    /// Track the pointer for the cursor follower.
    pub cursor_follower: bool,
    /// Text the typewriter animates.
    pub typewriter_text: String,
    /// Typewriter delays.
    pub timings: TypewriterTimings,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            sections: section::default_order(),
            scroll_bias: DEFAULT_SCROLL_BIAS,
            cursor_follower: false,
            typewriter_text: String::new(),
            timings: TypewriterTimings::default(),
        }
    }
}

impl From<&SiteConfig> for ViewOptions {
    fn from(config: &SiteConfig) -> Self {
        Self {
            sections: config
                .layout
                .sections
                .iter()
                .map(|id| SectionId::from(id.as_str()))
                .collect(),
            scroll_bias: config.layout.scroll_bias,
            cursor_follower: config.layout.cursor_follower,
            typewriter_text: config.typewriter_text().to_string(),
            timings: config.typewriter.timings(),
        }
    }
}

// ============================================================================
// Events and outcomes
// ============================================================================

/// Pointer position in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// An input to a page view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// The client reports section geometry (page load, resize).
    Layout(Vec<SectionGeometry>),
    /// The window scrolled.
    Scroll {
        /// Vertical scroll offset.
        offset: f64,
    },
    /// The pointer moved.
    PointerMove(CursorPosition),
    /// The menu button was pressed.
    ToggleMenu,
    /// A navigation entry was clicked.
    Navigate {
        /// Target section id.
        section: String,
    },
    /// The page is going away.
    Teardown,
}

impl ViewEvent {
    /// Short name used in logs and metrics labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Layout(_) => "layout",
            Self::Scroll { .. } => "scroll",
            Self::PointerMove(_) => "pointer_move",
            Self::ToggleMenu => "toggle_menu",
            Self::Navigate { .. } => "navigate",
            Self::Teardown => "teardown",
        }
    }
}

/// View state reported to the client after every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    /// Section the navigation bar highlights.
    pub active_section: SectionId,
    /// Whether the mobile menu is shown.
    pub menu_open: bool,
    /// Latest pointer position, when the cursor follower is enabled.
    pub cursor: Option<CursorPosition>,
    /// Scroll the client should perform, if any.
    pub scroll_to: Option<ScrollRequest>,
}

/// Observable change caused by an event.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewChange {
    /// Another section became active.
    ActiveSection {
        /// Previously active section.
        from: SectionId,
        /// Newly active section.
        to: SectionId,
    },
    /// The menu opened or closed.
    Menu {
        /// New visibility.
        open: bool,
    },
    /// A navigation was requested.
    Navigation {
        /// Requested target.
        target: String,
        /// Whether a scroll request was issued.
        scrolled: bool,
    },
    /// The view was torn down.
    TornDown,
}

/// Result of [`PageView::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOutcome {
    /// State after the event.
    pub state: ViewSnapshot,
    /// Changes the event caused, in order.
    pub changes: Vec<ViewChange>,
    /// `true` when the event was dropped (view torn down, or no listener
    /// of that kind).
    pub ignored: bool,
}

// ============================================================================
// PageView
// ============================================================================

/// All interaction state of one open page.
#[derive(Debug)]
pub struct PageView {
    spy: ScrollSpy,
    menu: MenuToggle,
    navigator: SectionNavigator,
    layout: DocumentLayout,
    listeners: Listeners,
    cursor: Option<CursorPosition>,
    typewriter: Typewriter,
    ticker: Option<TypewriterTicker>,
    torn_down: bool,
}

impl PageView {
    /// Creates a page view and registers its listeners.
    ///
    /// The pointer listener is registered only when the cursor follower is
    /// enabled. The typewriter is not started; see
    /// [`PageView::start_typewriter`].
    #[must_use]
    pub fn new(options: ViewOptions) -> Self {
        let mut listeners = Listeners::new();
        listeners.register(ListenerKind::Scroll);
        if options.cursor_follower {
            listeners.register(ListenerKind::PointerMove);
        }
        Self {
            spy: ScrollSpy::new(options.sections, options.scroll_bias),
            menu: MenuToggle::new(),
            navigator: SectionNavigator::new(),
            layout: DocumentLayout::new(),
            listeners,
            cursor: None,
            typewriter: Typewriter::new(&options.typewriter_text, options.timings),
            ticker: None,
            torn_down: false,
        }
    }

    /// Starts the typewriter ticker and returns a frame receiver.
    ///
    /// Calling it again returns a receiver for the already running ticker.
    /// Must be called from within a tokio runtime.
    pub fn start_typewriter(&mut self, cancel: CancellationToken) -> watch::Receiver<Frame> {
        let typewriter = self.typewriter.clone();
        self.ticker
            .get_or_insert_with(|| TypewriterTicker::spawn(typewriter, cancel))
            .subscribe()
    }

    /// Returns a frame receiver if the typewriter is running.
    #[must_use]
    pub fn typewriter_frames(&self) -> Option<watch::Receiver<Frame>> {
        self.ticker.as_ref().map(TypewriterTicker::subscribe)
    }

    /// Current typewriter frame.
    #[must_use]
    pub fn typewriter_frame(&self) -> Frame {
        self.ticker
            .as_ref()
            .map_or_else(|| self.typewriter.frame(), TypewriterTicker::current)
    }

    /// Currently active section.
    #[must_use]
    pub fn active_section(&self) -> &SectionId {
        self.spy.active()
    }

    /// Whether the menu is open.
    #[must_use]
    pub const fn menu_open(&self) -> bool {
        self.menu.is_open()
    }

    /// Whether [`ViewEvent::Teardown`] has been applied.
    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Registered listeners.
    #[must_use]
    pub const fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// Current state without a scroll request.
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            active_section: self.spy.active().clone(),
            menu_open: self.menu.is_open(),
            cursor: self.cursor,
            scroll_to: None,
        }
    }

    /// Applies one event.
    ///
    /// Events after teardown are ignored and leave the state untouched.
    pub fn apply(&mut self, event: ViewEvent) -> ViewOutcome {
        if self.torn_down {
            tracing::trace!(kind = event.kind(), "event after teardown ignored");
            return self.ignored();
        }

        let mut changes = Vec::new();
        let mut scroll_to = None;

        match event {
            ViewEvent::Layout(geometry) => {
                self.layout = DocumentLayout::from_geometry(&geometry);
                let before = self.spy.active().clone();
                self.spy.refresh(&self.layout);
                self.push_active_change(before, &mut changes);
            }
            ViewEvent::Scroll { offset } => {
                if !self.listeners.is_listening(ListenerKind::Scroll) {
                    return self.ignored();
                }
                let before = self.spy.active().clone();
                self.spy.update(offset, &self.layout);
                self.push_active_change(before, &mut changes);
            }
            ViewEvent::PointerMove(position) => {
                if !self.listeners.is_listening(ListenerKind::PointerMove) {
                    return self.ignored();
                }
                self.cursor = Some(position);
            }
            ViewEvent::ToggleMenu => {
                let open = self.menu.toggle();
                changes.push(ViewChange::Menu { open });
            }
            ViewEvent::Navigate { section } => {
                let was_open = self.menu.is_open();
                scroll_to = self
                    .navigator
                    .navigate(&section, &self.layout, &mut self.menu);
                if was_open {
                    changes.push(ViewChange::Menu { open: false });
                }
                changes.push(ViewChange::Navigation {
                    target: section,
                    scrolled: scroll_to.is_some(),
                });
            }
            ViewEvent::Teardown => {
                self.teardown();
                changes.push(ViewChange::TornDown);
            }
        }

        let mut state = self.snapshot();
        state.scroll_to = scroll_to;
        ViewOutcome {
            state,
            changes,
            ignored: false,
        }
    }

    /// Unregisters all listeners and cancels the typewriter. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let removed = self.listeners.unregister_all();
        if let Some(ticker) = &self.ticker {
            ticker.cancel();
        }
        tracing::debug!(listeners = removed, "page view torn down");
    }

    /// Tears down and waits for the typewriter task to exit.
    pub async fn shutdown(&mut self) {
        self.teardown();
        if let Some(ticker) = self.ticker.take() {
            ticker.shutdown().await;
        }
    }

    fn push_active_change(&self, before: SectionId, changes: &mut Vec<ViewChange>) {
        let after = self.spy.active();
        if *after != before {
            changes.push(ViewChange::ActiveSection {
                from: before,
                to: after.clone(),
            });
        }
    }

    fn ignored(&self) -> ViewOutcome {
        ViewOutcome {
            state: self.snapshot(),
            changes: Vec::new(),
            ignored: true,
        }
    }
}
