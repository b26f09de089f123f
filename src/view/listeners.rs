//! Registry of document listeners a page view holds.
//!
//! The client attaches a scroll listener and a pointer-move listener when a
//! page view opens. Teardown unregisters both; events for a kind with no
//! registered listener are dropped.

use std::collections::HashMap;

use serde::Serialize;

/// Kind of document listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    /// Window scroll events.
    Scroll,
    /// Pointer (mouse) movement.
    PointerMove,
}

/// Handle returned by [`Listeners::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Explicit listener registry.
#[derive(Debug, Default)]
pub struct Listeners {
    next_id: u64,
    active: HashMap<ListenerId, ListenerKind>,
}

impl Listeners {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener of `kind`.
    pub fn register(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.active.insert(id, kind);
        id
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        self.active.remove(&id).is_some()
    }

    /// Unregisters every listener and returns how many were removed.
    pub fn unregister_all(&mut self) -> usize {
        let count = self.active.len();
        self.active.clear();
        count
    }

    /// Whether at least one listener of `kind` is registered.
    #[must_use]
    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.active.values().any(|k| *k == kind)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
