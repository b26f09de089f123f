//! Timer task driving a [`Typewriter`].
//!
//! One tokio task per page view sleeps for [`Typewriter::delay`], applies a
//! step and publishes the new [`Frame`] on a watch channel. Cancelling the
//! token stops the task; no frame is published after cancellation.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::typewriter::{Frame, Typewriter};

/// Handle to a running typewriter task.
#[derive(Debug)]
pub struct TypewriterTicker {
    frames: watch::Receiver<Frame>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TypewriterTicker {
    /// Spawns the ticker task. The current frame of `typewriter` is
    /// available immediately; later frames follow its delays.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(typewriter: Typewriter, cancel: CancellationToken) -> Self {
        let (tx, rx) = watch::channel(typewriter.frame());
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(run(typewriter, tx, task_cancel));
        Self {
            frames: rx,
            cancel,
            handle,
        }
    }

    /// Returns a new receiver for frames.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Frame> {
        self.frames.clone()
    }

    /// Returns the latest published frame.
    #[must_use]
    pub fn current(&self) -> Frame {
        self.frames.borrow().clone()
    }

    /// Returns `true` once the ticker has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops the ticker without waiting for the task to exit.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stops the ticker and waits for the task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.handle).await {
            debug!(error = %e, "typewriter task ended abnormally");
        }
    }
}

impl Drop for TypewriterTicker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(mut typewriter: Typewriter, tx: watch::Sender<Frame>, cancel: CancellationToken) {
    loop {
        let delay = typewriter.delay();
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
        if cancel.is_cancelled() {
            break;
        }
        typewriter.step();
        if tx.send(typewriter.frame()).is_err() {
            break;
        }
    }
    debug!("typewriter task stopped");
}
