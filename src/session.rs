//! Registry of open page views.
//!
//! Each browser tab that loads the page opens one session holding a
//! [`PageView`]. Sessions are keyed by a random UUID, mutated one event at a
//! time through a `DashMap` entry, and torn down on request, when idle for
//! too long, or on server shutdown. A session with an open typewriter
//! stream is never idle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SiteConfig;
use crate::error::SessionError;
use crate::observability::metrics;
use crate::observability::{Event, EventEmitter};
use crate::transport::ClientMessage;
use crate::view::{Frame, PageView, ViewChange, ViewEvent, ViewOptions, ViewOutcome, ViewSnapshot};

/// One open page view.
#[derive(Debug)]
struct Session {
    view: PageView,
    last_seen: Instant,
    streams: StreamLease,
}

impl Session {
    fn is_idle(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout && !self.streams.is_shared()
    }
}

/// Held by every open typewriter stream of a session; the sweeper skips
/// sessions while any lease is alive.
#[derive(Debug, Clone, Default)]
pub struct StreamLease(Arc<()>);

impl StreamLease {
    fn is_shared(&self) -> bool {
        Arc::strong_count(&self.0) > 1
    }
}

/// Settings for a [`SessionRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Options every new page view is created with.
    pub view: ViewOptions,
    /// Maximum number of concurrent sessions.
    pub max_sessions: usize,
    /// Idle time after which a session is torn down.
    pub idle_timeout: Duration,
    /// Run the typewriter ticker for each session.
    pub typewriter: bool,
}

impl From<&SiteConfig> for RegistryOptions {
    fn from(config: &SiteConfig) -> Self {
        Self {
            view: ViewOptions::from(config),
            max_sessions: config.server.max_sessions,
            idle_timeout: config.server.idle_timeout(),
            typewriter: true,
        }
    }
}

/// Concurrent map of open sessions.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Session>,
    /// Slots taken by open sessions, reserved before insertion.
    reserved: AtomicUsize,
    options: RegistryOptions,
    emitter: Arc<EventEmitter>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Creates an empty registry.
    ///
    /// Typewriter tickers run on child tokens of `cancel`, so cancelling it
    /// stops every ticker.
    #[must_use]
    pub fn new(
        options: RegistryOptions,
        emitter: Arc<EventEmitter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            reserved: AtomicUsize::new(0),
            options,
            emitter,
            cancel,
        }
    }

    /// Number of open sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Opens a session and returns its id and initial state.
    ///
    /// Must be called from within a tokio runtime when the typewriter is
    /// enabled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::LimitReached`] when `max_sessions` sessions
    /// are already open.
    pub fn open(&self) -> Result<(Uuid, ViewSnapshot), SessionError> {
        let limit = self.options.max_sessions;
        if self
            .reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limit).then_some(n + 1)
            })
            .is_err()
        {
            metrics::record_error("session_limit");
            return Err(SessionError::LimitReached { limit });
        }

        let id = Uuid::new_v4();
        let mut view = PageView::new(self.options.view.clone());
        if self.options.typewriter {
            view.start_typewriter(self.cancel.child_token());
        }
        let state = view.snapshot();
        self.sessions.insert(
            id,
            Session {
                view,
                last_seen: Instant::now(),
                streams: StreamLease::default(),
            },
        );

        debug!(session_id = %id, "session opened");
        self.emitter.emit(Event::SessionOpened {
            timestamp: Utc::now(),
            session_id: id.to_string(),
        });
        metrics::record_session_opened();
        metrics::set_sessions_active(self.sessions.len());
        Ok((id, state))
    }

    /// Applies a client message to a session and returns the new state.
    ///
    /// A `teardown` message closes the session; later messages for the same
    /// id fail with [`SessionError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for unknown or closed sessions.
    pub fn dispatch(
        &self,
        id: Uuid,
        message: ClientMessage,
    ) -> Result<ViewSnapshot, SessionError> {
        let kind = message.kind();
        let outcome = {
            let mut session = self
                .sessions
                .get_mut(&id)
                .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
            session.last_seen = Instant::now();
            let started = std::time::Instant::now();
            let outcome = session.view.apply(ViewEvent::from(message));
            metrics::record_view_event(kind, outcome.ignored, started.elapsed());
            outcome
        };

        let session_id = id.to_string();
        record_changes(&self.emitter, &session_id, &outcome);

        if outcome.changes.contains(&ViewChange::TornDown) {
            self.remove(id, "teardown");
        }
        Ok(outcome.state)
    }

    /// Returns a receiver for the session's typewriter frames and a lease
    /// that keeps the session from being swept while the stream is open.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for unknown sessions or when the
    /// typewriter is disabled.
    pub fn frames(
        &self,
        id: Uuid,
    ) -> Result<(watch::Receiver<Frame>, StreamLease), SessionError> {
        self.sessions
            .get(&id)
            .and_then(|session| {
                let frames = session.view.typewriter_frames()?;
                Some((frames, session.streams.clone()))
            })
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Tears a session down.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for unknown sessions.
    pub fn close(&self, id: Uuid, reason: &str) -> Result<(), SessionError> {
        if self.remove(id, reason) {
            Ok(())
        } else {
            Err(SessionError::NotFound(id.to_string()))
        }
    }

    /// Tears down every session idle for longer than the idle timeout and
    /// returns how many were closed. Sessions with an open typewriter
    /// stream are kept.
    pub fn sweep_idle(&self) -> usize {
        let timeout = self.options.idle_timeout;
        let expired: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| entry.is_idle(timeout))
            .map(|entry| *entry.key())
            .collect();

        expired
            .into_iter()
            .filter(|id| self.remove(*id, "idle"))
            .count()
    }

    /// Tears down every session.
    pub fn close_all(&self, reason: &str) {
        let ids: Vec<Uuid> = self.sessions.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.remove(id, reason);
        }
    }

    /// Spawns a task that calls [`SessionRegistry::sweep_idle`] every
    /// `interval` until the registry's token is cancelled.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = registry.cancel.cancelled() => {
                        debug!("session sweeper cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let closed = registry.sweep_idle();
                        if closed > 0 {
                            info!(closed, open = registry.len(), "closed idle sessions");
                        }
                    }
                }
            }
        })
    }

    fn remove(&self, id: Uuid, reason: &str) -> bool {
        let Some((_, mut session)) = self.sessions.remove(&id) else {
            return false;
        };
        self.reserved.fetch_sub(1, Ordering::AcqRel);
        session.view.teardown();
        debug!(session_id = %id, reason, "session closed");
        self.emitter.emit(Event::SessionClosed {
            timestamp: Utc::now(),
            session_id: id.to_string(),
            reason: reason.to_string(),
        });
        metrics::set_sessions_active(self.sessions.len());
        true
    }
}

/// Emits events and metrics for the changes an event caused.
pub fn record_changes(emitter: &EventEmitter, session_id: &str, outcome: &ViewOutcome) {
    for change in &outcome.changes {
        match change {
            ViewChange::ActiveSection { to, .. } => metrics::record_section_activation(to.as_str()),
            ViewChange::Navigation { scrolled, .. } => metrics::record_navigation(*scrolled),
            ViewChange::Menu { .. } | ViewChange::TornDown => {}
        }
        if let Some(event) = Event::from_change(session_id, change) {
            emitter.emit(event);
        }
    }
}
