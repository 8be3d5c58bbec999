//! Queued hand-off of formatted status blocks from the delivery thread to the
//! UI context.
//!
//! The sending half ([`Handoff`]) is `Send` and never blocks. The receiving
//! half ([`UiQueue`]) stays on the UI side and yields values strictly in the
//! order they were enqueued.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use tokio::sync::mpsc;

/// Creates a connected hand-off pair.
///
/// # Returns
/// The delivery-side sender and the UI-side queue.
pub fn channel() -> (Handoff, UiQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Handoff { tx }, UiQueue { rx, closed: false })
}

/// Delivery-side half of the hand-off.
#[derive(Debug, Clone)]
pub struct Handoff {
    tx: mpsc::UnboundedSender<String>,
}

impl Handoff {
    /// Enqueues a formatted block for the UI context.
    ///
    /// # Returns
    /// `false` if the UI side has been closed or dropped, in which case the
    /// value is discarded.
    pub fn enqueue(&self, text: String) -> bool {
        self.tx.send(text).is_ok()
    }

    /// Whether the UI side stopped accepting values.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// UI-side half of the hand-off.
#[derive(Debug)]
pub struct UiQueue {
    rx: mpsc::UnboundedReceiver<String>,
    closed: bool,
}

impl UiQueue {
    /// Takes the oldest pending value without waiting.
    pub fn try_next(&mut self) -> Option<String> {
        if self.closed {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Drains every pending value into `sink`, oldest first.
    ///
    /// # Returns
    /// How many values were handed to the sink.
    pub fn pump<F>(&mut self, sink: &mut F) -> usize
    where
        F: FnMut(String),
    {
        let mut delivered = 0;
        while let Some(text) = self.try_next() {
            sink(text);
            delivered += 1;
        }
        delivered
    }

    /// Waits for the next value.
    ///
    /// # Returns
    /// `None` once the queue is closed or every sender is gone.
    pub async fn recv(&mut self) -> Option<String> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    /// Stops accepting values and discards whatever is still queued.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }

    /// Whether [`UiQueue::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of values waiting to be delivered.
    pub fn len(&self) -> usize {
        if self.closed {
            0
        } else {
            self.rx.len()
        }
    }

    /// Whether nothing is waiting to be delivered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Stream for UiQueue {
    type Item = String;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        this.rx.poll_recv(cx)
    }
}
