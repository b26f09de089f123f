//! Single-session runtime over a message transport.
//!
//! The [`Server`] owns one [`PageView`] and feeds it the client messages read
//! from a [`Transport`]. After every message the resulting state is written
//! back; typewriter frames are forwarded by a separate task as they tick.
//! `folio session` runs this over stdin/stdout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FolioError, TransportError};
use crate::observability::metrics;
use crate::observability::{Event, EventEmitter};
use crate::session::record_changes;
use crate::transport::{ClientMessage, ServerMessage, Transport};
use crate::view::{Frame, PageView, ViewChange, ViewEvent, ViewOptions};

/// Options for constructing a [`Server`].
pub struct ServerOptions {
    /// Settings for the page view.
    pub view: ViewOptions,
    /// Transport carrying the session's messages.
    pub transport: Arc<dyn Transport>,
    /// Event emitter for structured events.
    pub event_emitter: Arc<EventEmitter>,
    /// Run the typewriter ticker and forward its frames.
    pub typewriter: bool,
    /// Token for cooperative shutdown.
    pub cancel: CancellationToken,
}

/// Why the message loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Eof,
    Teardown,
    Cancelled,
}

impl StopReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Eof => "eof",
            Self::Teardown => "teardown",
            Self::Cancelled => "shutdown",
        }
    }
}

/// Runtime for one page view over a transport.
pub struct Server {
    view: PageView,
    transport: Arc<dyn Transport>,
    event_emitter: Arc<EventEmitter>,
    typewriter: bool,
    cancel: CancellationToken,
    session_id: String,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("session_id", &self.session_id)
            .field("transport", &self.transport.transport_type())
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a server. Nothing runs until [`Server::run`].
    #[must_use]
    pub fn new(options: ServerOptions) -> Self {
        Self {
            view: PageView::new(options.view),
            transport: options.transport,
            event_emitter: options.event_emitter,
            typewriter: options.typewriter,
            cancel: options.cancel,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Runs the session until EOF, a `teardown` message, or cancellation.
    ///
    /// Malformed and oversized messages are answered with
    /// `ServerMessage::Error` and the session continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to read or write.
    pub async fn run(mut self) -> Result<(), FolioError> {
        info!(
            session_id = %self.session_id,
            transport = %self.transport.transport_type(),
            "session started"
        );
        self.event_emitter.emit(Event::SessionOpened {
            timestamp: Utc::now(),
            session_id: self.session_id.clone(),
        });
        metrics::record_session_opened();
        metrics::set_sessions_active(1);

        let result = self.serve().await;

        self.view.shutdown().await;
        metrics::set_sessions_active(0);

        let reason = match &result {
            Ok(reason) => reason.as_str().to_string(),
            Err(e) => format!("error: {e}"),
        };
        debug!(session_id = %self.session_id, %reason, "session ended");
        self.event_emitter.emit(Event::SessionClosed {
            timestamp: Utc::now(),
            session_id: self.session_id.clone(),
            reason,
        });

        result.map(|_| ())
    }

    async fn serve(&mut self) -> Result<StopReason, FolioError> {
        self.transport
            .send_message(&ServerMessage::State(self.view.snapshot()))
            .await?;

        let forwarder = if self.typewriter {
            let frames = self.view.start_typewriter(self.cancel.child_token());
            Some(spawn_frame_forwarder(frames, Arc::clone(&self.transport)))
        } else {
            None
        };

        let result = self.main_loop().await;

        self.view.teardown();
        if let Some(handle) = forwarder {
            match tokio::time::timeout(Duration::from_secs(2), handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "typewriter forwarder panicked"),
                Err(_) => warn!("typewriter forwarder did not finish within 2s"),
            }
        }
        result
    }

    /// Core message loop.
    async fn main_loop(&mut self) -> Result<StopReason, FolioError> {
        loop {
            let received = tokio::select! {
                () = self.cancel.cancelled() => {
                    info!("session cancelled");
                    return Ok(StopReason::Cancelled);
                }
                received = self.transport.receive_message() => received,
            };

            let message = match received {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!("transport EOF, ending session");
                    return Ok(StopReason::Eof);
                }
                Err(e @ (TransportError::Protocol(_) | TransportError::MessageTooLarge { .. })) => {
                    metrics::record_error("protocol");
                    self.transport
                        .send_message(&ServerMessage::Error {
                            message: e.to_string(),
                        })
                        .await?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if self.handle_message(message).await? {
                return Ok(StopReason::Teardown);
            }
        }
    }

    /// Applies one message and writes the resulting state. Returns `true`
    /// once the view has been torn down.
    async fn handle_message(&mut self, message: ClientMessage) -> Result<bool, FolioError> {
        let kind = message.kind();
        let start = Instant::now();
        let outcome = self.view.apply(ViewEvent::from(message));
        metrics::record_view_event(kind, outcome.ignored, start.elapsed());
        record_changes(&self.event_emitter, &self.session_id, &outcome);

        self.transport
            .send_message(&ServerMessage::State(outcome.state))
            .await?;
        Ok(outcome.changes.contains(&ViewChange::TornDown))
    }
}

/// Forwards every typewriter frame to the transport until the ticker stops.
fn spawn_frame_forwarder(
    mut frames: watch::Receiver<Frame>,
    transport: Arc<dyn Transport>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while frames.changed().await.is_ok() {
            let frame = frames.borrow_and_update().clone();
            if let Err(e) = transport
                .send_message(&ServerMessage::Typewriter(frame))
                .await
            {
                warn!(error = %e, "failed to forward typewriter frame");
                break;
            }
        }
        debug!("typewriter forwarder stopped");
    })
}
