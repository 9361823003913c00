//! Status fan-out
//!
//! Single producer, many observers. Each subscriber gets its own unbounded
//! queue so a slow observer never blocks the producer and never loses a
//! transition. The current value and the subscriber list live under one
//! lock: a subscriber registered between two publishes receives exactly the
//! value current at registration, then every later value in order.

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::value::StreamStatus;

struct Inner {
    current: StreamStatus,
    subscribers: Vec<mpsc::UnboundedSender<StreamStatus>>,
    closed: bool,
}

/// Broadcasts status values to every subscriber
pub(crate) struct StatusBroadcaster {
    inner: Mutex<Inner>,
}

impl StatusBroadcaster {
    pub(crate) fn new(initial: StreamStatus) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: initial,
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// The most recently published value
    pub(crate) fn current(&self) -> StreamStatus {
        self.inner.lock().current
    }

    /// Register a subscriber, seeded with the current value
    pub(crate) fn subscribe(&self) -> StatusSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();

        let _ = tx.send(inner.current);
        if !inner.closed {
            inner.subscribers.push(tx);
        }

        StatusSubscription { rx }
    }

    /// Replace the current value and deliver it to every live subscriber
    ///
    /// Returns the number of subscribers that received it.
    pub(crate) fn publish(&self, status: StreamStatus) -> usize {
        let mut inner = self.inner.lock();
        inner.current = status;
        inner.subscribers.retain(|tx| tx.send(status).is_ok());
        inner.subscribers.len()
    }

    /// Number of subscribers still listening
    pub(crate) fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    /// End every subscription after its queued values are drained
    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }
}

/// Ordered feed of status values
///
/// Yields the value current at subscription time, then every later value.
/// Returns `None` once the session manager has shut down and all queued
/// values were read.
#[derive(Debug)]
pub struct StatusSubscription {
    rx: mpsc::UnboundedReceiver<StreamStatus>,
}

impl StatusSubscription {
    /// Wait for the next status value
    pub async fn recv(&mut self) -> Option<StreamStatus> {
        self.rx.recv().await
    }

    /// Take the next status value if one is already queued
    pub fn try_recv(&mut self) -> Option<StreamStatus> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued
    pub fn drain(&mut self) -> Vec<StreamStatus> {
        let mut out = Vec::new();
        while let Some(status) = self.try_recv() {
            out.push(status);
        }
        out
    }
}
