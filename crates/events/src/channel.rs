//! Per-run progress channel using tokio mpsc channels

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::types::ProgressEvent;

/// Capacity for the progress channel
const DEFAULT_CAPACITY: usize = 256;

/// Create a progress channel with default capacity
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    progress_channel_with_capacity(DEFAULT_CAPACITY)
}

/// Create a progress channel with specified capacity
pub fn progress_channel_with_capacity(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    (
        ProgressSender {
            sender,
            event_count: Arc::new(AtomicUsize::new(0)),
        },
        ProgressReceiver { receiver },
    )
}

/// Producing half, owned by the orchestrator task of one run
#[derive(Clone)]
pub struct ProgressSender {
    sender: mpsc::Sender<ProgressEvent>,
    /// Number of events delivered (for monitoring)
    event_count: Arc<AtomicUsize>,
}

impl ProgressSender {
    /// Push an event, waiting for buffer space.
    ///
    /// Returns `false` once the receiving side is gone, which the caller
    /// treats as a disconnect.
    pub async fn send(&self, event: ProgressEvent) -> bool {
        match self.sender.send(event).await {
            Ok(()) => {
                self.event_count.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => false,
        }
    }

    /// Resolves when the receiving side has been dropped or closed
    pub async fn closed(&self) {
        self.sender.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Get the total number of events delivered
    pub fn event_count(&self) -> usize {
        self.event_count.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender")
            .field("closed", &self.is_closed())
            .field("event_count", &self.event_count())
            .finish()
    }
}

/// Consuming half, held by whoever streams events to the operator
#[derive(Debug)]
pub struct ProgressReceiver {
    receiver: mpsc::Receiver<ProgressEvent>,
}

impl ProgressReceiver {
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.receiver.recv().await
    }

    /// Close the channel from the receiving side.
    ///
    /// Events already buffered can still be drained with [`recv`](Self::recv).
    pub fn close(&mut self) {
        self.receiver.close()
    }
}

impl Stream for ProgressReceiver {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
