//! Bridges one telemetry subscription to one UI sink.
//!
//! [`StatusForwarder`] runs on the delivery thread: it decodes and renders
//! each status message and enqueues the text. [`TaskStatusPresenter`] lives on
//! the UI side, owns the subscription and the sink, and is the only thing that
//! ever calls the sink.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use log::{debug, info, warn};

use crate::{
    error::Result,
    handoff::{self, Handoff, UiQueue},
    message::{render_status, StatusMessage},
    telemetry::{Subscription, TelemetrySource},
};

/// Delivery-side half of the presenter.
#[derive(Debug, Clone)]
pub struct StatusForwarder {
    topic: String,
    handoff: Handoff,
    skipped: Arc<AtomicU64>,
}

impl StatusForwarder {
    pub fn new(topic: impl Into<String>, handoff: Handoff) -> Self {
        Self {
            topic: topic.into(),
            handoff,
            skipped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Renders `msg` and queues it for the UI context.
    ///
    /// # Returns
    /// `false` if the UI side is gone and the block was discarded.
    pub fn on_message(&self, msg: &StatusMessage) -> bool {
        self.handoff.enqueue(render_status(msg))
    }

    /// Decodes a raw payload and forwards it. Malformed payloads are logged
    /// and skipped.
    pub fn on_payload(&self, payload: &[u8]) {
        match StatusMessage::decode(payload) {
            Ok(msg) => {
                if !self.on_message(&msg) {
                    debug!("overlay closed, dropping status for {}", msg.name);
                }
            }
            Err(e) => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                warn!("skipping message on {}: {e}", self.topic);
            }
        }
    }

    /// Number of malformed payloads skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    fn skipped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.skipped)
    }
}

/// Shows the latest task status through a UI-thread-only sink.
///
/// The sink does not need to be `Send`: it is only invoked from [`pump`] and
/// [`next_update`], i.e. on whatever context owns the presenter.
///
/// [`pump`]: TaskStatusPresenter::pump
/// [`next_update`]: TaskStatusPresenter::next_update
pub struct TaskStatusPresenter<S>
where
    S: FnMut(String),
{
    topic: String,
    subscription: Option<Subscription>,
    queue: UiQueue,
    sink: S,
    skipped: Arc<AtomicU64>,
}

impl<S> TaskStatusPresenter<S>
where
    S: FnMut(String),
{
    /// Subscribes to `topic` and wires it to `sink`.
    ///
    /// # Arguments
    /// * `source` - The telemetry transport to subscribe on.
    /// * `topic` - The topic carrying task status messages.
    /// * `sink` - Receives each formatted block, on the owning context only.
    ///
    /// # Errors
    /// Returns an error if the source refuses the subscription.
    pub fn attach<T>(source: &T, topic: &str, sink: S) -> Result<Self>
    where
        T: TelemetrySource + ?Sized,
    {
        let (tx, queue) = handoff::channel();
        let forwarder = StatusForwarder::new(topic, tx);
        let skipped = forwarder.skipped_counter();

        // The handler owns the only sender: the queue closes with the subscription.
        let subscription = source.subscribe(
            topic,
            Box::new(move |payload: &[u8]| forwarder.on_payload(payload)),
        )?;
        info!("task status presenter attached to {topic}");

        Ok(Self {
            topic: topic.to_string(),
            subscription: Some(subscription),
            queue,
            sink,
            skipped,
        })
    }

    /// Delivers every queued block to the sink, oldest first. Never blocks.
    ///
    /// # Returns
    /// How many blocks were delivered.
    pub fn pump(&mut self) -> usize {
        self.queue.pump(&mut self.sink)
    }

    /// Waits for the next block and delivers it to the sink.
    ///
    /// # Returns
    /// `false` once the presenter has been disposed or the source has stopped
    /// delivering.
    pub async fn next_update(&mut self) -> bool {
        match self.queue.recv().await {
            Some(text) => {
                (self.sink)(text);
                true
            }
            None => false,
        }
    }

    /// Unsubscribes and discards anything still queued. Once this returns the
    /// sink is never called again.
    pub fn dispose(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            info!("task status presenter detached from {}", self.topic);
        }
        self.queue.close();
    }

    pub fn is_disposed(&self) -> bool {
        self.subscription.is_none()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of malformed payloads skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

impl<S> Drop for TaskStatusPresenter<S>
where
    S: FnMut(String),
{
    fn drop(&mut self) {
        self.dispose();
    }
}
