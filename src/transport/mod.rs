//! Wire messages and the transport abstraction.
//!
//! Clients send [`ClientMessage`]s (DOM events forwarded by the page script,
//! or NDJSON lines on stdin) and receive [`ServerMessage`]s (view state and
//! typewriter frames). The HTTP surface speaks the same messages as JSON
//! bodies and Server-Sent Events.

pub mod http;
pub mod stdio;

pub use http::{HttpConfig, HttpServer, OpenSessionResponse};
pub use stdio::StdioTransport;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::view::{CursorPosition, Frame, SectionGeometry, ViewEvent, ViewSnapshot};

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Default maximum size of one client message in bytes (64 KB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Default buffer size for the stdio transport (16 KB).
pub const DEFAULT_STDIO_BUFFER_SIZE: usize = 16 * 1024;

// ============================================================================
// Messages
// ============================================================================

/// A message from the page to the view engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Section geometry, sent on load and on resize.
    Layout {
        /// Mounted sections.
        sections: Vec<SectionGeometry>,
    },
    /// Window scroll offset.
    Scroll {
        /// Vertical offset in pixels.
        offset: f64,
    },
    /// Pointer position.
    PointerMove {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
    },
    /// Menu button pressed.
    ToggleMenu,
    /// Navigation entry clicked.
    Navigate {
        /// Target section id.
        section: String,
    },
    /// Page is unloading.
    Teardown,
}

impl ClientMessage {
    /// The `type` tag of this message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Layout { .. } => "layout",
            Self::Scroll { .. } => "scroll",
            Self::PointerMove { .. } => "pointer_move",
            Self::ToggleMenu => "toggle_menu",
            Self::Navigate { .. } => "navigate",
            Self::Teardown => "teardown",
        }
    }
}

impl From<ClientMessage> for ViewEvent {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Layout { sections } => Self::Layout(sections),
            ClientMessage::Scroll { offset } => Self::Scroll { offset },
            ClientMessage::PointerMove { x, y } => Self::PointerMove(CursorPosition { x, y }),
            ClientMessage::ToggleMenu => Self::ToggleMenu,
            ClientMessage::Navigate { section } => Self::Navigate { section },
            ClientMessage::Teardown => Self::Teardown,
        }
    }
}

/// A message from the view engine to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// View state after an event.
    State(ViewSnapshot),
    /// Typewriter frame.
    Typewriter(Frame),
    /// The previous message could not be handled.
    Error {
        /// What went wrong.
        message: String,
    },
}

// ============================================================================
// Transport trait
// ============================================================================

/// Async transport carrying one session's messages.
///
/// Uses `&self` with interior mutability so one task can read while another
/// writes.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends one message with transport framing.
    async fn send_message(&self, message: &ServerMessage) -> Result<()>;

    /// Receives the next client message.
    ///
    /// Returns `Ok(None)` on EOF. Malformed or oversized input yields an
    /// error; the transport stays usable afterwards.
    async fn receive_message(&self) -> Result<Option<ClientMessage>>;

    /// Returns the type of this transport for logging and metrics.
    fn transport_type(&self) -> TransportType;
}

/// Transport type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    /// NDJSON over stdin/stdout.
    Stdio,
    /// HTTP POST + Server-Sent Events.
    Http,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Truncates and strips control characters from untrusted input before
/// logging.
pub(crate) fn sanitize_for_log(input: &str, max_len: usize) -> String {
    input
        .chars()
        .take(max_len)
        .map(|c| {
            if c.is_control() && c != '\t' {
                '\u{FFFD}'
            } else {
                c
            }
        })
        .collect()
}

/// Reads an environment variable, parsing it to type `T`, or returns the
/// default. Logs a warning if the variable is set but unparseable.
pub(crate) fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(name, value = %v, "invalid env var value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Phase, SectionId};

    #[test]
    fn client_messages_parse() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"scroll","offset":750}"#).unwrap();
        assert_eq!(msg, ClientMessage::Scroll { offset: 750.0 });

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"toggle_menu"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ToggleMenu);

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"layout","sections":[{"id":"hero","top":0,"height":800}]}"#,
        )
        .unwrap();
        assert_eq!(msg.kind(), "layout");

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"pointer_move","x":1.5,"y":2}"#).unwrap();
        assert_eq!(
            ViewEvent::from(msg),
            ViewEvent::PointerMove(CursorPosition { x: 1.5, y: 2.0 })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"click"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"scroll"}"#).is_err());
    }

    #[test]
    fn state_message_shape() {
        let msg = ServerMessage::State(ViewSnapshot {
            active_section: SectionId::new("about"),
            menu_open: false,
            cursor: None,
            scroll_to: None,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["active_section"], "about");
        assert_eq!(json["menu_open"], false);
        assert!(json["cursor"].is_null());
    }

    #[test]
    fn typewriter_message_shape() {
        let msg = ServerMessage::Typewriter(Frame {
            text: "Deb".to_string(),
            caret: false,
            phase: Phase::Typing,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "typewriter");
        assert_eq!(json["text"], "Deb");
        assert_eq!(json["phase"], "typing");
    }

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("a\nb\tc", 10), "a\u{FFFD}b\tc");
        assert_eq!(sanitize_for_log("abcdef", 3), "abc");
    }

    #[test]
    fn env_or_default() {
        let value: usize = env_or("FOLIO_TEST_NONEXISTENT_VAR_12345", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn transport_type_display() {
        assert_eq!(TransportType::Stdio.to_string(), "stdio");
        assert_eq!(TransportType::Http.to_string(), "http");
    }
}
