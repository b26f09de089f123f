//! Typewriter text animator.
//!
//! A finite-state machine that types a target string one character at a
//! time, pauses, deletes it one character at a time, pauses, and repeats
//! forever. The machine is pure: [`Typewriter::step`] advances it and
//! [`Typewriter::delay`] says how long to wait before the next step. The
//! timing loop lives in [`super::ticker`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Current phase of the animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Appending characters.
    Typing,
    /// Full text shown, waiting before deletion starts.
    PausedFull,
    /// Removing characters.
    Deleting,
    /// Nothing shown, waiting before typing starts.
    PausedEmpty,
}

impl Phase {
    /// Returns the wire name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Typing => "typing",
            Self::PausedFull => "paused_full",
            Self::Deleting => "deleting",
            Self::PausedEmpty => "paused_empty",
        }
    }
}

/// Per-phase delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterTimings {
    /// Delay between typed characters.
    pub type_interval: Duration,
    /// Delay between deleted characters.
    pub delete_interval: Duration,
    /// Pause once the full text is shown.
    pub pause_full: Duration,
    /// Pause once the text is empty.
    pub pause_empty: Duration,
}

impl Default for TypewriterTimings {
    fn default() -> Self {
        Self {
            type_interval: Duration::from_millis(100),
            delete_interval: Duration::from_millis(50),
            pause_full: Duration::from_millis(2000),
            pause_empty: Duration::from_millis(500),
        }
    }
}

/// What a consumer should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Currently visible prefix of the target text.
    pub text: String,
    /// Whether to show the blinking caret (full text visible).
    pub caret: bool,
    /// Phase the machine is in.
    pub phase: Phase,
}

/// Typewriter state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typewriter {
    target: Vec<char>,
    len: usize,
    phase: Phase,
    timings: TypewriterTimings,
}

impl Typewriter {
    /// Creates a typewriter for `target` in the initial state (empty text,
    /// [`Phase::PausedEmpty`]).
    #[must_use]
    pub fn new(target: &str, timings: TypewriterTimings) -> Self {
        Self {
            target: target.chars().collect(),
            len: 0,
            phase: Phase::PausedEmpty,
            timings,
        }
    }

    /// Number of characters currently shown.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is shown.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of characters in the target text.
    #[must_use]
    pub fn target_len(&self) -> usize {
        self.target.len()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Configured timings.
    #[must_use]
    pub const fn timings(&self) -> TypewriterTimings {
        self.timings
    }

    /// Applies one transition.
    ///
    /// Does nothing when the target text is empty.
    pub fn step(&mut self) {
        if self.target.is_empty() {
            return;
        }
        match self.phase {
            Phase::Typing | Phase::PausedEmpty => self.grow(),
            Phase::Deleting | Phase::PausedFull => self.shrink(),
        }
    }

    fn grow(&mut self) {
        self.len = (self.len + 1).min(self.target.len());
        self.phase = if self.len == self.target.len() {
            Phase::PausedFull
        } else {
            Phase::Typing
        };
    }

    fn shrink(&mut self) {
        self.len = self.len.saturating_sub(1);
        self.phase = if self.len == 0 {
            Phase::PausedEmpty
        } else {
            Phase::Deleting
        };
    }

    /// Wait before the next step.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        match self.phase {
            Phase::Typing => self.timings.type_interval,
            Phase::PausedFull => self.timings.pause_full,
            Phase::Deleting => self.timings.delete_interval,
            Phase::PausedEmpty => self.timings.pause_empty,
        }
    }

    /// Text currently shown.
    #[must_use]
    pub fn text(&self) -> String {
        self.target[..self.len].iter().collect()
    }

    /// Snapshot of what to display.
    #[must_use]
    pub fn frame(&self) -> Frame {
        Frame {
            text: self.text(),
            caret: !self.target.is_empty() && self.len == self.target.len(),
            phase: self.phase,
        }
    }
}
