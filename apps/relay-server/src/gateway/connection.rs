//! Handle to a single client's outbound channel.
//!
//! The socket itself lives in the per-connection task (see `server.rs`).
//! Everything else in the gateway only ever sees this handle: a bounded queue
//! of serialized frames plus an open flag and a shutdown signal.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use relay_common::ConnectionId;
use tokio::sync::{mpsc, Notify};

/// Frames dropped on a full queue before the connection is forcibly closed.
pub const MAX_DROPPED_FRAMES: u64 = 100;

/// Result of a single send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The frame was queued for the writer.
    Queued,
    /// The connection is not open; nothing was attempted.
    Skipped,
    /// The queue was full and the frame was discarded.
    Dropped,
}

struct Inner {
    id: ConnectionId,
    tx: mpsc::Sender<Arc<str>>,
    open: AtomicBool,
    dropped: AtomicU64,
    shutdown: Notify,
}

/// Cloneable handle to one connected client.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    /// Create a handle with an outbound queue of `capacity` frames. The
    /// returned receiver is drained by the connection's writer.
    pub fn new(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let conn = Self {
            inner: Arc::new(Inner {
                id,
                tx,
                open: AtomicBool::new(true),
                dropped: AtomicU64::new(0),
                shutdown: Notify::new(),
            }),
        };
        (conn, rx)
    }

    pub fn id(&self) -> &ConnectionId {
        &self.inner.id
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    /// Total frames discarded because the queue was full.
    pub fn dropped_frames(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Queue a serialized frame without waiting.
    pub fn send(&self, frame: Arc<str>) -> SendOutcome {
        if !self.is_open() {
            return SendOutcome::Skipped;
        }

        match self.inner.tx.try_send(frame) {
            Ok(()) => SendOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.inner.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped >= MAX_DROPPED_FRAMES {
                    tracing::warn!(connection_id = %self.inner.id, dropped, "closing slow connection");
                    self.close();
                } else {
                    tracing::warn!(
                        connection_id = %self.inner.id,
                        dropped,
                        "send queue full, frame dropped"
                    );
                }
                SendOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Writer is gone; the socket is already down.
                self.close();
                SendOutcome::Skipped
            }
        }
    }

    /// Mark the connection closed and wake every task waiting on
    /// [`Connection::closed`]. Returns `true` only for the call that actually
    /// performed the transition.
    pub fn close(&self) -> bool {
        if self.inner.open.swap(false, Ordering::AcqRel) {
            self.inner.shutdown.notify_waiters();
            true
        } else {
            false
        }
    }

    /// Resolves once [`Connection::close`] has been called.
    pub async fn closed(&self) {
        let mut notified = std::pin::pin!(self.inner.shutdown.notified());
        // Register before checking the flag so a concurrent close is not missed.
        notified.as_mut().enable();
        if !self.is_open() {
            return;
        }
        notified.await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("open", &self.is_open())
            .finish()
    }
}
