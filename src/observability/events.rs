//! Structured event stream.
//!
//! Discrete, typed events emitted while serving page views. Events are
//! written as newline-delimited JSON with a monotonically increasing
//! sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::view::{SectionId, ViewChange};

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event. Serialized with a `"type"` tag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The server is listening.
    ServerStarted {
        /// When the server started.
        timestamp: DateTime<Utc>,
        /// Page title from the site file.
        site: String,
        /// Surface name (`"http"` or `"stdio"`).
        transport: String,
    },

    /// The server has stopped.
    ServerStopped {
        /// When the server stopped.
        timestamp: DateTime<Utc>,
        /// Human-readable stop reason.
        reason: String,
    },

    /// A page view was opened.
    SessionOpened {
        /// When the session opened.
        timestamp: DateTime<Utc>,
        /// Session id.
        session_id: String,
    },

    /// A page view was torn down.
    SessionClosed {
        /// When the session closed.
        timestamp: DateTime<Utc>,
        /// Session id.
        session_id: String,
        /// Why it closed (`"teardown"`, `"idle"`, `"eof"`, `"shutdown"`).
        reason: String,
    },

    /// The scroll spy picked a new section.
    ActiveSectionChanged {
        /// When the change happened.
        timestamp: DateTime<Utc>,
        /// Session id.
        session_id: String,
        /// Previously active section.
        from: SectionId,
        /// Newly active section.
        to: SectionId,
    },

    /// A navigation entry was clicked.
    NavigationRequested {
        /// When the click was handled.
        timestamp: DateTime<Utc>,
        /// Session id.
        session_id: String,
        /// Requested section.
        target: String,
        /// Whether a scroll was issued (false for unmounted targets).
        scrolled: bool,
    },

    /// The mobile menu opened or closed.
    MenuToggled {
        /// When the toggle happened.
        timestamp: DateTime<Utc>,
        /// Session id.
        session_id: String,
        /// New visibility.
        open: bool,
    },
}

impl Event {
    /// Maps a view change to its event. Teardown is reported separately as
    /// [`Event::SessionClosed`] and yields `None`.
    #[must_use]
    pub fn from_change(session_id: &str, change: &ViewChange) -> Option<Self> {
        let timestamp = Utc::now();
        let session_id = session_id.to_string();
        match change {
            ViewChange::ActiveSection { from, to } => Some(Self::ActiveSectionChanged {
                timestamp,
                session_id,
                from: from.clone(),
                to: to.clone(),
            }),
            ViewChange::Menu { open } => Some(Self::MenuToggled {
                timestamp,
                session_id,
                open: *open,
            }),
            ViewChange::Navigation { target, scrolled } => Some(Self::NavigationRequested {
                timestamp,
                session_id,
                target: target.clone(),
                scrolled: *scrolled,
            }),
            ViewChange::TornDown => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization or I/O failures are dropped; the event stream never stops
/// the server.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stderr.
    ///
    /// Used by `folio session`, whose stdout carries protocol messages.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope { sequence, event };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn lines(&self) -> Vec<serde_json::Value> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn emits_tagged_lines_with_sequence() {
        let writer = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(writer.clone()));

        emitter.emit(Event::SessionOpened {
            timestamp: Utc::now(),
            session_id: "s1".to_string(),
        });
        emitter.emit(Event::MenuToggled {
            timestamp: Utc::now(),
            session_id: "s1".to_string(),
            open: true,
        });

        let lines = writer.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "SessionOpened");
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[1]["type"], "MenuToggled");
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["open"], true);
        assert_eq!(emitter.event_count(), 2);
    }

    #[test]
    fn section_ids_serialize_as_strings() {
        let writer = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(writer.clone()));
        emitter.emit(Event::ActiveSectionChanged {
            timestamp: Utc::now(),
            session_id: "s1".to_string(),
            from: SectionId::new("hero"),
            to: SectionId::new("about"),
        });
        let lines = writer.lines();
        assert_eq!(lines[0]["from"], "hero");
        assert_eq!(lines[0]["to"], "about");
    }

    #[test]
    fn from_change_maps_view_changes() {
        let nav = Event::from_change(
            "s1",
            &ViewChange::Navigation {
                target: "blog".to_string(),
                scrolled: false,
            },
        );
        assert!(matches!(
            nav,
            Some(Event::NavigationRequested { scrolled: false, .. })
        ));
        assert!(Event::from_change("s1", &ViewChange::TornDown).is_none());
    }

    #[test]
    fn noop_counts_events() {
        let emitter = EventEmitter::noop();
        emitter.emit(Event::ServerStopped {
            timestamp: Utc::now(),
            reason: "test".to_string(),
        });
        assert_eq!(emitter.event_count(), 1);
    }

    #[test]
    fn from_file_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let emitter = EventEmitter::from_file(&path).unwrap();
        emitter.emit(Event::ServerStarted {
            timestamp: Utc::now(),
            site: "Portfolio".to_string(),
            transport: "http".to_string(),
        });
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"type\":\"ServerStarted\""));
    }
}
